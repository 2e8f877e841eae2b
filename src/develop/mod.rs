//! Developable-area extraction: the site boundary minus every disqualifying
//! constraint layer, split into labeled parts.

mod biodiversity;
mod builder;
mod context;
mod parts;
mod site;

pub use builder::{query_envelope, BuildOutput, DevelopableAreaBuilder, StageOutcome, StageReport};
pub use context::{area_name, RunContext};
pub use site::{sites, Site};
