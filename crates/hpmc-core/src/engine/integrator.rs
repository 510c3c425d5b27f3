use super::backend::{self, ExecutionBackend};
use super::cell_list::CellList;
use super::comm::{Communicator, LocalDomain};
use super::config::{BackendKind, IntegratorConfig, RebuildPolicy};
use super::context::QueryContext;
use super::counters::{MoveCounters, RunStatistics};
use super::depletants::DepletantPlan;
use super::error::EngineError;
use super::external::{ExternalField, PatchEnergy};
use super::kernel::SweepKernel;
use super::progress::ProgressReporter;
use super::state::IntegratorState;
use super::tasks::overlaps::{self, OverlapPair};
use crate::core::models::ids::TypeId;
use crate::core::models::particle::ParticleStore;
use crate::core::params::{OverlapMatrix, ParamError, ParameterStore};
use crate::core::shapes::metadata::type_shape;
use crate::core::shapes::{self, Shape, ShapeSpec};
use nalgebra::{UnitQuaternion, Vector3};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// State that only exists while a particle store is attached.
struct Attachment {
    store: ParticleStore,
    params: ParameterStore,
    matrix: OverlapMatrix,
    cells: Option<CellList>,
}

impl Attachment {
    fn new(store: ParticleStore) -> Self {
        let params = ParameterStore::new(store.num_types());
        Self {
            store,
            params,
            matrix: OverlapMatrix::new(),
            cells: None,
        }
    }

    fn type_name(&self, type_id: TypeId) -> String {
        self.store
            .type_name(type_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{type_id}"))
    }

    /// Fails if any type present in the store cannot be simulated as configured.
    fn check_configuration(&self) -> Result<(), EngineError> {
        let is_2d = self.store.sim_box().is_2d();
        for type_id in self.store.active_types() {
            let Some(shape) = self.params.shape(type_id) else {
                return Err(EngineError::Configuration {
                    type_name: self.type_name(type_id),
                    reason: "no shape parameters have been set".to_string(),
                });
            };
            if shape.kind().is_planar() && !is_2d {
                return Err(EngineError::Configuration {
                    type_name: self.type_name(type_id),
                    reason: format!("{} requires a two-dimensional box", shape.kind()),
                });
            }
        }
        if !self.params.quermass() {
            for type_id in self.params.depletant_types() {
                if self.params.shape(type_id).is_none() {
                    return Err(EngineError::Configuration {
                        type_name: self.type_name(type_id),
                        reason: "a depletant fugacity is set but no shape".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn require_shape(&self, type_id: TypeId) -> Result<&Shape, EngineError> {
        if type_id >= self.store.num_types() {
            return Err(ParamError::UnknownType(type_id).into());
        }
        self.params
            .shape(type_id)
            .ok_or_else(|| EngineError::Configuration {
                type_name: self.type_name(type_id),
                reason: "no shape parameters have been set".to_string(),
            })
    }

    /// Center-to-center distance beyond which nothing a trial move does can matter.
    fn interaction_range(&self, plan: &DepletantPlan, patch: Option<&dyn PatchEnergy>) -> f64 {
        let active = self.store.active_types();
        let colloids = 2.0 * self.params.max_circumradius(active.iter().copied());
        let range = colloids + 2.0 * plan.max_radius();
        match patch {
            Some(patch) => range.max(patch.cutoff()),
            None => range,
        }
    }
}

/// Everything the passes of one sweep share.
struct Passes<'a> {
    config: &'a IntegratorConfig,
    backend: &'a dyn ExecutionBackend,
    plan: &'a DepletantPlan,
    patch: Option<&'a dyn PatchEnergy>,
    field: Option<&'a dyn ExternalField>,
    range: f64,
    timestep: u64,
}

impl Passes<'_> {
    /// Runs `nselect` passes, committing each color as it completes.
    fn run(&self, attached: &mut Attachment) -> Result<MoveCounters, EngineError> {
        let range = self.range;
        let mut sweep_counters = MoveCounters::default();
        let max_move = attached.params.max_d(attached.store.active_types());
        let images = attached.store.sim_box().image_vectors(range);
        let interactions = attached.matrix.table(attached.store.num_types());
        let num_particles = attached.store.len();

        for pass in 0..attached.params.nselect() {
            let stale = match &attached.cells {
                None => true,
                Some(cells) => {
                    (pass == 0 && self.config.rebuild == RebuildPolicy::EverySweep)
                        || !cells.supports_pass(range, max_move, num_particles)
                }
            };
            if stale {
                attached.cells = Some(CellList::build(
                    attached.store.sim_box(),
                    attached.store.particles(),
                    range,
                    max_move,
                    self.config.rebuild.margin(),
                ));
            }
            let cells = attached
                .cells
                .as_mut()
                .ok_or_else(|| EngineError::Internal("cell list missing after rebuild".into()))?;
            if !cells.supports_pass(range, max_move, num_particles) {
                return Err(EngineError::Internal(format!(
                    "fresh cell list with dims {:?} cannot hold range {range} and move {max_move}",
                    cells.dims()
                )));
            }

            let colors: Vec<Vec<usize>> = cells.colors().map(<[usize]>::to_vec).collect();
            let mut pass_drift = 0.0f64;
            for color in &colors {
                let outcomes = {
                    let kernel = SweepKernel {
                        store: &attached.store,
                        params: &attached.params,
                        interactions: &interactions,
                        cells: &*cells,
                        images: &images,
                        depletants: self.plan,
                        patch: self.patch,
                        field: self.field,
                        seed: self.config.seed,
                        timestep: self.timestep,
                        pass,
                    };
                    self.backend.run_color(&kernel, color)
                };
                for outcome in outcomes {
                    sweep_counters += outcome.counters;
                    pass_drift = pass_drift.max(outcome.max_displacement);
                    for update in outcome.updates {
                        if !attached.store.set_pose(
                            update.index,
                            update.position,
                            update.orientation.into_inner(),
                        ) {
                            return Err(EngineError::Internal(format!(
                                "accepted move for out-of-range particle index {}",
                                update.index
                            )));
                        }
                    }
                }
            }
            cells.record_drift(pass_drift);
        }

        Ok(sweep_counters)
    }
}

/// Hard-particle Monte Carlo integrator.
///
/// Owns the particle store while attached, together with the per-type parameters, the overlap
/// matrix and the cell list. Each [`sweep`](Self::sweep) runs `nselect` passes; in every pass
/// each particle is offered one trial move, color by color.
pub struct HpmcIntegrator {
    config: IntegratorConfig,
    backend: Box<dyn ExecutionBackend>,
    communicator: Box<dyn Communicator>,
    patch: Option<Box<dyn PatchEnergy>>,
    field: Option<Box<dyn ExternalField>>,
    attached: Option<Attachment>,
    timestep: u64,
    counters: MoveCounters,
    last_run: Option<RunStatistics>,
    orientation_warned: bool,
}

impl HpmcIntegrator {
    pub fn new(config: IntegratorConfig) -> Self {
        let backend = backend::create(config.backend);
        Self {
            config,
            backend,
            communicator: Box::new(LocalDomain),
            patch: None,
            field: None,
            attached: None,
            timestep: 0,
            counters: MoveCounters::default(),
            last_run: None,
            orientation_warned: false,
        }
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn set_backend(&mut self, kind: BackendKind) {
        self.config.backend = kind;
        self.backend = backend::create(kind);
    }

    /// Installs a custom scheduler, e.g. an accelerator-backed one.
    pub fn set_execution_backend(&mut self, backend: Box<dyn ExecutionBackend>) {
        self.backend = backend;
    }

    pub fn set_rebuild_policy(&mut self, policy: RebuildPolicy) {
        self.config.rebuild = policy;
        if let Some(attached) = self.attached.as_mut() {
            attached.cells = None;
        }
    }

    pub fn set_communicator(&mut self, communicator: Box<dyn Communicator>) {
        self.communicator = communicator;
    }

    pub fn set_patch(&mut self, patch: Option<Box<dyn PatchEnergy>>) {
        self.patch = patch;
    }

    pub fn set_external_field(&mut self, field: Option<Box<dyn ExternalField>>) {
        self.field = field;
    }

    /// Takes ownership of `store` with fresh, empty parameters. A previously attached store is
    /// returned.
    pub fn attach(&mut self, store: ParticleStore) -> Option<ParticleStore> {
        info!(
            num_particles = store.len(),
            num_types = store.num_types(),
            "Attaching particle store."
        );
        self.orientation_warned = false;
        self.attached
            .replace(Attachment::new(store))
            .map(|old| old.store)
    }

    /// Hands the store back and discards parameters, the overlap matrix and the cell list.
    pub fn detach(&mut self) -> Option<ParticleStore> {
        self.attached.take().map(|attached| attached.store)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    fn attachment(&self) -> Result<&Attachment, EngineError> {
        self.attached.as_ref().ok_or(EngineError::Detached)
    }

    fn attachment_mut(&mut self) -> Result<&mut Attachment, EngineError> {
        self.attached.as_mut().ok_or(EngineError::Detached)
    }

    pub fn store(&self) -> Result<&ParticleStore, EngineError> {
        Ok(&self.attachment()?.store)
    }

    /// Mutable access to the particles. The cell list is rebuilt before the next sweep.
    pub fn store_mut(&mut self) -> Result<&mut ParticleStore, EngineError> {
        let attached = self.attachment_mut()?;
        attached.cells = None;
        Ok(&mut attached.store)
    }

    pub fn params(&self) -> Result<&ParameterStore, EngineError> {
        Ok(&self.attachment()?.params)
    }

    pub fn params_mut(&mut self) -> Result<&mut ParameterStore, EngineError> {
        let attached = self.attachment_mut()?;
        attached.params.ensure_types(attached.store.num_types());
        Ok(&mut attached.params)
    }

    pub fn overlap_matrix(&self) -> Result<&OverlapMatrix, EngineError> {
        Ok(&self.attachment()?.matrix)
    }

    pub fn overlap_matrix_mut(&mut self) -> Result<&mut OverlapMatrix, EngineError> {
        Ok(&mut self.attachment_mut()?.matrix)
    }

    /// Sets the shape of the type called `type_name`.
    pub fn set_shape(&mut self, type_name: &str, spec: ShapeSpec) -> Result<(), EngineError> {
        let attached = self.attachment_mut()?;
        let type_id =
            attached
                .store
                .type_id(type_name)
                .ok_or_else(|| EngineError::Configuration {
                    type_name: type_name.to_string(),
                    reason: "no particle type with this name".to_string(),
                })?;
        attached.params.ensure_types(attached.store.num_types());
        attached.params.set_shape(type_id, spec)?;
        Ok(())
    }

    /// Enables or disables overlap checks between two named types. Returns `false` without
    /// error when either name is unknown.
    pub fn set_overlap_check(&mut self, a: &str, b: &str, enabled: bool) -> Result<bool, EngineError> {
        let attached = self.attachment_mut()?;
        match (attached.store.type_id(a), attached.store.type_id(b)) {
            (Some(ia), Some(ib)) => {
                attached.matrix.set(ia, ib, enabled);
                Ok(true)
            }
            _ => {
                debug!(a, b, "Skipping overlap setting for unknown type.");
                Ok(false)
            }
        }
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn set_timestep(&mut self, timestep: u64) {
        self.timestep = timestep;
    }

    /// Counters accumulated since the last reset.
    pub fn counters(&self) -> MoveCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = MoveCounters::default();
    }

    pub fn last_run(&self) -> Option<&RunStatistics> {
        self.last_run.as_ref()
    }

    pub(crate) fn record_run(&mut self, stats: RunStatistics) {
        self.last_run = Some(stats);
    }

    pub fn moves_per_second(&self) -> f64 {
        self.last_run
            .as_ref()
            .map_or(0.0, RunStatistics::moves_per_second)
    }

    pub fn interaction_range(&self) -> Result<f64, EngineError> {
        let attached = self.attachment()?;
        let planar = attached.store.sim_box().is_2d();
        let plan = DepletantPlan::from_params(&attached.params, planar)?;
        Ok(attached.interaction_range(&plan, self.patch.as_deref()))
    }

    /// Checks that every type present can be simulated. Logs a one-time warning for
    /// orientations that are not unit quaternions.
    pub fn validate(&mut self) -> Result<(), EngineError> {
        let attached = self.attachment_mut()?;
        attached.params.ensure_types(attached.store.num_types());
        attached.check_configuration()?;

        if !self.orientation_warned {
            let attached = self.attachment()?;
            if let Some(index) = attached.store.first_non_unit_orientation() {
                let record = &attached.store.particles()[index];
                warn!(
                    tag = record.tag,
                    norm = record.orientation.norm(),
                    "Particle orientation is not a unit quaternion; it is used as given."
                );
                self.orientation_warned = true;
            }
        }
        Ok(())
    }

    /// Runs one sweep and returns its counters, which are also added to the running totals.
    #[instrument(skip_all, name = "hpmc_sweep", fields(timestep = self.timestep))]
    pub fn sweep(&mut self) -> Result<MoveCounters, EngineError> {
        self.validate()?;

        let Self {
            config,
            backend,
            communicator,
            patch,
            field,
            attached,
            timestep,
            counters,
            ..
        } = self;
        let attached = attached.as_mut().ok_or(EngineError::Detached)?;
        let patch = patch.as_deref();
        let field = field.as_deref();

        let planar = attached.store.sim_box().is_2d();
        let plan = DepletantPlan::from_params(&attached.params, planar)?;
        let range = attached.interaction_range(&plan, patch);
        if communicator.exchange(&mut attached.store, range)? {
            attached.cells = None;
        }

        if attached.store.is_empty() {
            *timestep += 1;
            return Ok(MoveCounters::default());
        }

        // A failed pass puts every particle back where the sweep found it.
        let poses = attached.store.poses();
        let passes = Passes {
            config,
            backend: &**backend,
            plan: &plan,
            patch,
            field,
            range,
            timestep: *timestep,
        };
        let sweep_counters = match passes.run(attached) {
            Ok(counters) => counters,
            Err(e) => {
                attached.store.restore_poses(&poses);
                attached.cells = None;
                return Err(e);
            }
        };

        *timestep += 1;
        *counters += sweep_counters;
        debug!(
            moves = sweep_counters.move_count(),
            overlap_checks = sweep_counters.overlap_checks,
            "Sweep complete."
        );
        Ok(sweep_counters)
    }

    /// Tests two shapes of the given types at separation `r_ij`. With `use_images` every
    /// periodic image within reach is tried; `exclude_self` then skips the primary image.
    #[allow(clippy::too_many_arguments)]
    pub fn test_overlap(
        &self,
        type_i: TypeId,
        type_j: TypeId,
        r_ij: &Vector3<f64>,
        q_i: &UnitQuaternion<f64>,
        q_j: &UnitQuaternion<f64>,
        use_images: bool,
        exclude_self: bool,
    ) -> Result<bool, EngineError> {
        let attached = self.attachment()?;
        let shape_i = attached.require_shape(type_i)?;
        let shape_j = attached.require_shape(type_j)?;
        if !use_images {
            return Ok(shapes::test_overlap(shape_i, shape_j, r_ij, q_i, q_j));
        }

        let sim_box = attached.store.sim_box();
        let reach = shape_i.circumsphere_radius() + shape_j.circumsphere_radius();
        let base = sim_box.min_image(r_ij);
        Ok(sim_box
            .image_vectors(reach)
            .iter()
            .filter(|image| !(exclude_self && **image == Vector3::zeros()))
            .any(|image| shapes::test_overlap(shape_i, shape_j, &(base + image), q_i, q_j)))
    }

    /// All currently overlapping pairs, by tag.
    pub fn map_overlaps(
        &self,
        reporter: &ProgressReporter<'_>,
    ) -> Result<Vec<OverlapPair>, EngineError> {
        let attached = self.attachment()?;
        attached.check_configuration()?;
        let interactions = attached.matrix.table(attached.store.num_types());
        let context = QueryContext::new(&attached.store, &attached.params, &interactions, reporter);
        overlaps::run(&context)
    }

    pub fn count_overlaps(&self) -> Result<usize, EngineError> {
        Ok(self.map_overlaps(&ProgressReporter::new())?.len())
    }

    /// Geometric description of each type's shape in type-id order; `null` for unset types.
    pub fn type_shapes(&self) -> Result<Vec<Value>, EngineError> {
        let attached = self.attachment()?;
        Ok((0..attached.store.num_types())
            .map(|type_id| {
                attached
                    .params
                    .shape_spec(type_id)
                    .map_or(Value::Null, type_shape)
            })
            .collect())
    }

    pub fn snapshot_state(&self) -> Result<IntegratorState, EngineError> {
        let attached = self.attachment()?;
        Ok(IntegratorState::capture(
            &attached.store,
            &attached.params,
            &attached.matrix,
            self.timestep,
        ))
    }

    pub fn restore_state(&mut self, state: &IntegratorState) -> Result<(), EngineError> {
        let attached = self.attachment_mut()?;
        state.apply(&attached.store, &mut attached.params, &mut attached.matrix)?;
        attached.cells = None;
        self.timestep = state.timestep;
        Ok(())
    }
}
