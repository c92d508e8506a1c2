mod tracing;

pub(crate) use sim_channel::*;
pub(crate) use tracing::*;
