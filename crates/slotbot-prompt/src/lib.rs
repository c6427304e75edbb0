pub mod bot;
pub mod controller;
pub mod validator;

pub use bot::SlotBot;
pub use controller::{
    PromptOptions, PromptSettings, PromptTurnController, TurnOutcome, DEFAULT_CULTURE,
};
pub use validator::{MinimumValidator, Validator};
