//! Turns samples of the focused window into usage. [sampler::Sampler] attributes time between
//! samples and [collector::TrackingModule] drives it on a schedule.

pub mod afk;
pub mod collector;
pub mod sampler;
