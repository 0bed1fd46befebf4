//! Spreadsheet export for scraped product records.
//!
//! Records go out as CSV, one row per product, with either Portuguese or
//! English headers. The column order is fixed by the field order on
//! [`ProductRecord`].

use crate::config::{Config, HeaderLocale};
use crate::sites::{ProductRecord, Site};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Portuguese header row, matching the sheets the affiliate workflow keeps.
pub const PT_HEADERS: [&str; 11] = [
    "ID",
    "Categoria",
    "Nome_Produto",
    "Valor_Original",
    "Valor_Promocional",
    "Parcelamento",
    "Avaliacao",
    "Link_Produto",
    "Link_Afiliado",
    "Link_Imagem",
    "Descricao",
];

/// Builds the timestamped export filename for a site.
pub fn export_filename(site: Site) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_products_{}.csv", site.label(), timestamp)
}

/// Writes product records to CSV files.
pub struct Exporter {
    output_dir: PathBuf,
    locale: HeaderLocale,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, locale: HeaderLocale) -> Self {
        Self { output_dir: output_dir.into(), locale }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir.clone(), config.header_locale)
    }

    /// Exports records to a timestamped file in the output directory and
    /// returns the path. An empty record set still produces a file with the
    /// header row.
    pub fn export(&self, site: Site, records: &[ProductRecord]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", self.output_dir.display())
        })?;

        let path = self.output_dir.join(export_filename(site));
        self.write_to(&path, records)?;
        info!("Exported {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Writes records to an explicit path.
    pub fn write_to(&self, path: &Path, records: &[ProductRecord]) -> Result<()> {
        match self.locale {
            HeaderLocale::En => {
                // serde derives the header row from the field names
                let mut writer = csv::Writer::from_path(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                for record in records {
                    writer.serialize(record)?;
                }
                if records.is_empty() {
                    writer.write_record(en_headers())?;
                }
                writer.flush()?;
            }
            HeaderLocale::Pt => {
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_path(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                writer.write_record(PT_HEADERS)?;
                for record in records {
                    writer.serialize(record)?;
                }
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn en_headers() -> [&'static str; 11] {
    [
        "id",
        "category",
        "title",
        "original_price",
        "discount_price",
        "installments",
        "rating",
        "link",
        "affiliate_link",
        "image_url",
        "description",
    ]
}

/// Reads records back from an exported file, regardless of header locale.
///
/// Columns are positional, so Portuguese and English exports both parse.
pub fn read_records(path: &Path) -> Result<Vec<ProductRecord>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, row) in reader.into_records().enumerate() {
        let row = row?;
        if idx == 0 {
            // header row, either locale
            continue;
        }
        let record: ProductRecord = row
            .deserialize(None)
            .with_context(|| format!("Malformed record on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
