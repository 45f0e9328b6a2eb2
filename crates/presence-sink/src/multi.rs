use presence_core::error::AppError;
use presence_core::models::AggregatedRecord;
use presence_core::traits::ResultSink;

/// Fans each batch out to several sinks.
///
/// Every sink sees every batch even when an earlier one fails; the first
/// error is returned afterwards. Sinks may be borrowed (`&mut sink`) so the
/// caller can inspect them once the run is over.
#[derive(Default)]
pub struct MultiSink<'a> {
    sinks: Vec<Box<dyn ResultSink + 'a>>,
}

impl<'a> MultiSink<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ResultSink + 'a) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ResultSink for MultiSink<'_> {
    fn append(&mut self, records: &[AggregatedRecord]) -> Result<(), AppError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.append(records) {
                tracing::warn!(error = %e, "Sink rejected batch");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
