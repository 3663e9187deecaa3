use crate::error::Result;
use crate::fetch::PageSource;
use crate::locate::locate_flow_images;
use crate::ocr::OcrEngine;
use crate::parse::parse_reading;
use crate::store::FlowStore;
use crate::types::CycleOutcome;
use std::sync::Arc;
use tracing::{debug, info};

/// Wires the extraction stages together behind their seams: page source,
/// recognition engine, and store.
pub struct Pipeline {
    source: Arc<dyn PageSource>,
    ocr: Arc<dyn OcrEngine>,
    store: Arc<dyn FlowStore>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        ocr: Arc<dyn OcrEngine>,
        store: Arc<dyn FlowStore>,
    ) -> Self {
        Self { source, ocr, store }
    }

    /// One full poll cycle: fetch -> locate -> recognize -> parse -> store.
    /// Stages run strictly in sequence; the first failure aborts the cycle
    /// and nothing is stored for it.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        info!("polling source page");
        let html = self.source.fetch_page().await?;
        let images = locate_flow_images(&html)?;

        info!("performing OCR on images to extract data");
        let last_update = self.ocr.recognize(&images.last_update).await?;
        let turbine_text = self.ocr.recognize(&images.through_turbine).await?;
        let pond_hatch_text = self.ocr.recognize(&images.through_pond_hatch).await?;
        debug!(%last_update, %turbine_text, %pond_hatch_text, "OCR results");

        let reading = parse_reading(&last_update, &turbine_text, &pond_hatch_text);

        if self.store.exists(&reading.last_update).await? {
            return Ok(CycleOutcome::Duplicate(reading));
        }
        if self.store.insert(&reading).await? {
            Ok(CycleOutcome::Inserted(reading))
        } else {
            // Lost a race on the unique key; the constraint kept one row.
            Ok(CycleOutcome::Duplicate(reading))
        }
    }
}
