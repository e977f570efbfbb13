// self
use crate::{
	_prelude::*,
	obs::{OpKind, RefreshEvent},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("storefront_client.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for a refresh lifecycle point, or a warning when the refresh failed.
pub fn trace_refresh_event(event: RefreshEvent, flight: u64) {
	#[cfg(feature = "tracing")]
	{
		match event {
			RefreshEvent::Started => tracing::debug!(flight, "session refresh started"),
			RefreshEvent::Joined => tracing::debug!(flight, "joined in-flight session refresh"),
			RefreshEvent::Succeeded => tracing::debug!(flight, "session refresh succeeded"),
			RefreshEvent::Failed =>
				tracing::warn!(flight, "session refresh failed; local session invalidated"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, flight);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refresh_events_noop_without_subscriber() {
		trace_refresh_event(RefreshEvent::Failed, 7);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::Send, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
