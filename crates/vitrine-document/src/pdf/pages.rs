// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagination for the compact rendering path: one standalone PDF per page,
// sized in points, for the host rasterizer.

use tracing::{debug, instrument};
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::types::PageRaster;

use super::reader::PdfReader;

/// Split `data` into one `PageRaster` per page, in document order.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn paginate(data: &[u8]) -> Result<Vec<PageRaster>> {
    let reader = PdfReader::from_bytes(data)?;
    if reader.page_count() == 0 {
        return Err(VitrineError::PdfError("document has no pages".into()));
    }

    let mut rasters = Vec::with_capacity(reader.page_count() as usize);
    for page_number in reader.page_numbers() {
        let (width, height) = reader.page_size(page_number)?;
        rasters.push(PageRaster {
            page_number,
            width,
            height,
            pdf_bytes: reader.extract_page(page_number)?,
        });
    }

    debug!(pages = rasters.len(), "document paginated");
    Ok(rasters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::text_pdf;

    #[test]
    fn one_raster_per_page() {
        let rasters = paginate(&text_pdf(&["a", "b", "c"])).unwrap();
        let numbers: Vec<u32> = rasters.iter().map(|r| r.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(rasters.iter().all(|r| !r.pdf_bytes.is_empty()));
        assert_eq!(rasters[0].scaled(1.5), (892.5, 1263.0));
    }

    #[test]
    fn malformed_bytes_fail() {
        assert!(paginate(b"%PDF-1.5\nnonsense").is_err());
    }
}
