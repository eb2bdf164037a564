use crate::domain::instance::Instance;
use crate::domain::models::{
    add_assignment, add_centers, add_distance_limit, add_epigraph, minimize, CompiledModel,
    Layout, ModelBuilder,
};
use crate::domain::problem::Problem;
use crate::domain::variant::Variant;
use crate::error::Result;

/// Classical p-center: open exactly `p` centers, assign every client to one
/// of them, minimize the largest assigned distance.
pub struct ClassicalModel;

impl ModelBuilder for ClassicalModel {
    fn build(&self, instance: &Instance) -> Result<CompiledModel> {
        let mut problem = Problem::new(format!("p-center {}", instance.name()));

        let open = add_centers(&mut problem, instance);
        let max_distance = add_epigraph(&mut problem, "max_distance");
        let primary = add_assignment(&mut problem, instance, &open, "x");
        add_distance_limit(&mut problem, instance, &primary, max_distance, "distance_limit");
        minimize(&mut problem, max_distance);

        Ok(CompiledModel {
            variant: Variant::Classical,
            problem,
            open,
            max_distance,
            layout: Layout::Single { primary },
        })
    }

    fn variant(&self) -> Variant {
        Variant::Classical
    }
}
