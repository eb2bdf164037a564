use crate::domain::instance::Instance;
use crate::domain::models::{
    add_assignment, add_capacity_limit, add_centers, add_distance_limit, add_epigraph, minimize,
    CompiledModel, Layout, ModelBuilder,
};
use crate::domain::problem::Problem;
use crate::domain::variant::Variant;
use crate::error::Result;

/// Capacitated p-center: the classical model plus a demand/capacity limit on
/// every potential center.
pub struct CapacitatedModel;

impl ModelBuilder for CapacitatedModel {
    fn build(&self, instance: &Instance) -> Result<CompiledModel> {
        instance.capacity_data()?;

        let mut problem = Problem::new(format!("capacitated p-center {}", instance.name()));

        let open = add_centers(&mut problem, instance);
        let max_distance = add_epigraph(&mut problem, "max_distance");
        let primary = add_assignment(&mut problem, instance, &open, "x");
        add_capacity_limit(&mut problem, instance, &primary, "capacity_limit")?;
        add_distance_limit(&mut problem, instance, &primary, max_distance, "distance_limit");
        minimize(&mut problem, max_distance);

        Ok(CompiledModel {
            variant: Variant::Capacitated,
            problem,
            open,
            max_distance,
            layout: Layout::Single { primary },
        })
    }

    fn variant(&self) -> Variant {
        Variant::Capacitated
    }
}
