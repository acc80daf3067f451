use crate::api::types::ObjectId;
use crate::program::command::Condition;
use crate::runtime::context::RunContext;

/// Evaluate a condition from the point of view of `owner`.
/// Distance checks on a missing owner are false.
pub fn evaluate(condition: &Condition, owner: ObjectId, ctx: &mut RunContext) -> bool {
    match condition {
        Condition::NearPlayer(distance) => ctx
            .distance_to_player(owner)
            .is_some_and(|d| d <= *distance),
        Condition::FarFromPlayer(distance) => ctx
            .distance_to_player(owner)
            .is_some_and(|d| d > *distance),
        Condition::KeyPressed(key) => ctx.input.is_held(key),
        Condition::AnyKey => ctx.input.any_held(),
        Condition::Variable { name, op, value } => op.apply(ctx.variables.get(name), *value),
        Condition::Chance(percent) => ctx.rng.chance(*percent),
    }
}
