//! Table sink addressing.

use url::Url;

use crate::error::{AppError, Result};

/// App and table identifiers of an external table, parsed from its share URL.
///
/// Expected shape: `https://<host>/base/<app_token>?table=<table_id>[&view=...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub app_token: String,
    pub table_id: String,
}

impl TableTarget {
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;

        let mut segments = url
            .path_segments()
            .ok_or_else(|| AppError::config(format!("table URL has no path: {raw}")))?
            .filter(|s| !s.is_empty());

        let app_token = match (segments.next(), segments.next(), segments.next()) {
            (Some("base"), Some(token), None) => token.to_string(),
            _ => {
                return Err(AppError::config(format!(
                    "table URL path must be /base/<app_token>: {raw}"
                )));
            }
        };

        let table_id = url
            .query_pairs()
            .find(|(key, _)| key == "table")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::config(format!("table URL is missing the 'table' query parameter: {raw}"))
            })?;

        Ok(Self {
            app_token,
            table_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_share_url() {
        let target =
            TableTarget::from_url("https://acme.feishu.cn/base/AppTok123?table=tblXyz&view=vew1")
                .unwrap();
        assert_eq!(target.app_token, "AppTok123");
        assert_eq!(target.table_id, "tblXyz");
    }

    #[test]
    fn test_rejects_missing_table_param() {
        let err = TableTarget::from_url("https://acme.feishu.cn/base/AppTok123?view=vew1");
        assert!(matches!(err, Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_wrong_path() {
        assert!(TableTarget::from_url("https://acme.feishu.cn/wiki/AppTok123?table=t").is_err());
        assert!(TableTarget::from_url("https://acme.feishu.cn/base?table=t").is_err());
        assert!(TableTarget::from_url("https://acme.feishu.cn/base/a/b?table=t").is_err());
    }

    #[test]
    fn test_rejects_non_url() {
        assert!(matches!(
            TableTarget::from_url("not a url"),
            Err(AppError::Url(_))
        ));
    }
}
