//! State owned by the results pipeline: selected file, current result set,
//! page position and confidence filter.

use std::io::{self, Write};

use crate::dataset::DatasetFile;
use crate::results::{
    ClassSummary, PageError, PredictionRow, ResultSet, is_high_confidence, paginate, total_pages,
    write_csv,
};
use crate::service::ServiceError;

use super::jobs::RequestId;

/// Outcome of offering a finished job to a pipeline.
#[derive(Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The response belonged to a superseded or cancelled request.
    Stale,
    Applied,
    Failed,
}

/// Rows of the page currently on screen.
#[derive(Debug)]
pub struct PageView<'a> {
    /// 1-based page number.
    pub index: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub rows: Vec<&'a PredictionRow>,
}

#[derive(Debug)]
pub struct ResultsPipeline {
    dataset: Option<DatasetFile>,
    result_set: Option<ResultSet>,
    columns: Vec<String>,
    summary: ClassSummary,
    /// Indices into the result set that pass the current filter.
    visible: Vec<usize>,
    page_index: usize,
    page_size: usize,
    high_confidence_only: bool,
    threshold: f64,
    pending: Option<RequestId>,
    last_error: Option<String>,
}

impl ResultsPipeline {
    pub fn new(page_size: usize, threshold: f64) -> Self {
        Self {
            dataset: None,
            result_set: None,
            columns: Vec::new(),
            summary: ClassSummary::default(),
            visible: Vec::new(),
            page_index: 0,
            page_size: page_size.max(1),
            high_confidence_only: false,
            threshold,
            pending: None,
            last_error: None,
        }
    }

    pub fn dataset(&self) -> Option<&DatasetFile> {
        self.dataset.as_ref()
    }

    /// Replace the selected file; the previous results no longer apply to it.
    pub(crate) fn select_dataset(&mut self, dataset: DatasetFile) {
        if self.pending.take().is_some() {
            tracing::info!("Dropping in-flight prediction for the previous file");
        }
        self.dataset = Some(dataset);
        self.clear_results();
        self.last_error = None;
    }

    pub(crate) fn begin_submit(&mut self, request_id: RequestId) {
        self.pending = Some(request_id);
        self.last_error = None;
    }

    pub(crate) fn apply_response(
        &mut self,
        request_id: RequestId,
        result: Result<ResultSet, ServiceError>,
    ) -> ApplyOutcome {
        if self.pending != Some(request_id) {
            tracing::debug!(request_id, "Ignoring stale prediction response");
            return ApplyOutcome::Stale;
        }
        self.pending = None;
        match result {
            Ok(result_set) => {
                self.set_result_set(result_set);
                ApplyOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(kind = err.kind(), "Prediction failed: {err}");
                self.clear_results();
                self.last_error = Some(err.to_string());
                ApplyOutcome::Failed
            }
        }
    }

    /// Forget any in-flight request so its response is dropped on arrival.
    pub(crate) fn cancel_pending(&mut self) {
        self.pending = None;
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn result_set(&self) -> Option<&ResultSet> {
        self.result_set.as_ref()
    }

    /// Table columns for the current result set.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Label counts over the whole result set, regardless of filter.
    pub fn summary(&self) -> ClassSummary {
        self.summary
    }

    pub fn high_confidence_only(&self) -> bool {
        self.high_confidence_only
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Toggle the confidence filter and return to the first page.
    pub fn set_high_confidence_only(&mut self, enabled: bool) {
        if self.high_confidence_only == enabled {
            return;
        }
        self.high_confidence_only = enabled;
        self.refresh_visible();
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn total_count(&self) -> usize {
        self.result_set.as_ref().map_or(0, ResultSet::len)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.visible.len(), self.page_size)
    }

    /// Current page number, or 0 when there is nothing to show.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn current_page(&self) -> Option<PageView<'_>> {
        let result_set = self.result_set.as_ref()?;
        let page = paginate(&self.visible, self.page_index, self.page_size).ok()?;
        let rows = page
            .rows
            .iter()
            .filter_map(|&index| result_set.rows().get(index))
            .collect();
        Some(PageView {
            index: page.index,
            total_pages: page.total_pages,
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            rows,
        })
    }

    /// Jump to a page; out-of-range requests leave the position unchanged.
    pub fn go_to_page(&mut self, page_index: usize) -> Result<(), PageError> {
        let total = self.total_pages();
        if page_index == 0 || page_index > total {
            return Err(PageError::OutOfRange {
                requested: page_index,
                total_pages: total,
            });
        }
        self.page_index = page_index;
        Ok(())
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.page_index + 1).is_ok()
    }

    pub fn previous_page(&mut self) -> bool {
        self.page_index > 1 && self.go_to_page(self.page_index - 1).is_ok()
    }

    /// Export the filtered rows with the displayed columns.
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let Some(result_set) = self.result_set.as_ref() else {
            return write_csv(writer, &[], &self.columns);
        };
        let rows: Vec<&PredictionRow> = self
            .visible
            .iter()
            .filter_map(|&index| result_set.rows().get(index))
            .collect();
        write_csv(writer, &rows, &self.columns)
    }

    fn set_result_set(&mut self, result_set: ResultSet) {
        self.columns = result_set.feature_columns();
        self.summary = result_set.summary();
        self.result_set = Some(result_set);
        self.refresh_visible();
    }

    fn clear_results(&mut self) {
        self.result_set = None;
        self.columns.clear();
        self.summary = ClassSummary::default();
        self.visible.clear();
        self.page_index = 0;
    }

    fn refresh_visible(&mut self) {
        self.visible = match self.result_set.as_ref() {
            Some(result_set) => result_set
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| {
                    !self.high_confidence_only || is_high_confidence(row, self.threshold)
                })
                .map(|(index, _)| index)
                .collect(),
            None => Vec::new(),
        };
        self.page_index = if self.visible.is_empty() { 0 } else { 1 };
    }
}
