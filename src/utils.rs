/// Tracing helpers for streams
#[cfg(feature = "tokio-rt")]
mod fastrace;

/// Test utils
#[cfg(test)]
pub(crate) mod tests;

#[cfg(feature = "tokio-rt")]
pub(crate) use self::fastrace::TraceStreamExt;
