//! RunConfig — the operator/CI-confirmed run parameters, consumed by CodeGen.

use serde::{Deserialize, Serialize};

use super::understanding::BrowserMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    FirstPage,
    Limit5,
    AllPages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    FirstPage,
    All,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub mode: PaginationMode,
    pub max_pages: u32,
}

impl PaginationConfig {
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(1..=50).contains(&self.max_pages) {
            return Err(crate::types::ScrapeError::Validation(format!(
                "max_pages must be in [1, 50], got {}",
                self.max_pages
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Xlsx,
    All,
}

impl OutputFormat {
    pub fn writes_csv(self) -> bool {
        matches!(self, Self::Csv | Self::All)
    }

    pub fn writes_xlsx(self) -> bool {
        matches!(self, Self::Xlsx | Self::All)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelection {
    pub name: String,
    pub selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub fields: Vec<FieldSelection>,
    pub pagination: Pagination,
    pub pagination_config: PaginationConfig,
    pub format: OutputFormat,
    pub browser_mode: BrowserMode,
}

impl RunConfig {
    /// Enforces the invariant: once a login has happened, the browser mode is
    /// coerced to headed for all subsequent work.
    pub fn coerce_headed_if_logged_in(&mut self, login_performed: bool) {
        if login_performed {
            self.browser_mode = BrowserMode::Headed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_config_range() {
        assert!(PaginationConfig { mode: PaginationMode::All, max_pages: 0 }.validate().is_err());
        assert!(PaginationConfig { mode: PaginationMode::All, max_pages: 51 }.validate().is_err());
        assert!(PaginationConfig { mode: PaginationMode::All, max_pages: 5 }.validate().is_ok());
    }

    #[test]
    fn login_coerces_headed() {
        let mut cfg = RunConfig {
            fields: vec![],
            pagination: Pagination::FirstPage,
            pagination_config: PaginationConfig { mode: PaginationMode::FirstPage, max_pages: 1 },
            format: OutputFormat::Json,
            browser_mode: BrowserMode::Headless,
        };
        cfg.coerce_headed_if_logged_in(true);
        assert_eq!(cfg.browser_mode, BrowserMode::Headed);
    }
}
