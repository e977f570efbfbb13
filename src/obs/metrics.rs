// self
use crate::obs::{OpKind, OpOutcome, RefreshEvent};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"storefront_client_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a refresh lifecycle point via the global metrics recorder (when enabled).
pub fn record_refresh_metric(event: RefreshEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("storefront_client_refresh_total", "event" => event.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_op_outcome_noop_without_metrics() {
		record_op_outcome(OpKind::Refresh, OpOutcome::Failure);
		record_refresh_metric(RefreshEvent::Joined);
	}

	#[cfg(feature = "metrics")]
	#[test]
	fn refresh_metric_is_labeled_by_event() {
		// std
		use std::sync::Mutex as StdMutex;
		// crates.io
		use metrics::{
			Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
		};

		#[derive(Default)]
		struct KeyLog(StdMutex<Vec<(String, Vec<(String, String)>)>>);
		impl Recorder for KeyLog {
			fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

			fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

			fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

			fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
				let labels = key
					.labels()
					.map(|label| (label.key().to_owned(), label.value().to_owned()))
					.collect();

				self.0.lock().expect("Key log lock poisoned.").push((key.name().to_owned(), labels));

				Counter::noop()
			}

			fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
				Gauge::noop()
			}

			fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
				Histogram::noop()
			}
		}

		let log = KeyLog::default();

		metrics::with_local_recorder(&log, || record_refresh_metric(RefreshEvent::Failed));

		let keys = log.0.into_inner().expect("Key log lock poisoned.");

		assert_eq!(
			keys,
			vec![(
				"storefront_client_refresh_total".to_owned(),
				vec![("event".to_owned(), "failed".to_owned())],
			)],
		);
	}
}
