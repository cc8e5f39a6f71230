pub mod calculators;
pub mod commands;
pub mod conditions;
pub mod engine;
pub mod item_effects;
pub mod move_effects;
pub mod side;
pub mod state;
pub mod turn_effects;

#[cfg(test)]
pub mod tests;
