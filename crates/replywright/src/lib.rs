pub mod contract;
pub mod drafting;
pub mod handlers;
pub mod matching;
pub mod refiner;
pub mod selection;
pub mod signals;
pub mod state;
pub mod utils;
