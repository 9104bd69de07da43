// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod demo;
pub mod error;
pub mod ids;
pub mod input;
pub mod lobby;
pub mod model;
pub mod prefs;
pub mod state;
pub mod surface;
pub mod table;

pub use demo::*;
pub use error::*;
pub use ids::*;
pub use input::*;
pub use lobby::*;
pub use model::*;
pub use prefs::*;
pub use state::*;
pub use surface::*;
pub use table::*;
