//! Screen display modes and configuration rules.
//!
//! A screen is either `dynamic` (a template rendered with an ordered list
//! of products) or `static` (a single uploaded image). The two halves of the
//! configuration are mutually exclusive.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Template-driven screen showing a product list.
pub const MODE_DYNAMIC: &str = "dynamic";
/// Screen showing a single static asset.
pub const MODE_STATIC: &str = "static";

/// All valid screen modes.
pub const VALID_SCREEN_MODES: &[&str] = &[MODE_DYNAMIC, MODE_STATIC];

/// Maximum length of any entity display name.
pub const MAX_NAME_LEN: usize = 200;

/// Upper bound on products attached to a single dynamic screen.
pub const MAX_PRODUCTS_PER_SCREEN: usize = 100;

// ---------------------------------------------------------------------------
// ScreenMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenMode {
    Dynamic,
    Static,
}

impl ScreenMode {
    /// Parse from the database / API string form.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            MODE_DYNAMIC => Ok(Self::Dynamic),
            MODE_STATIC => Ok(Self::Static),
            other => Err(CoreError::Validation(format!(
                "Invalid screen mode '{other}'. Must be one of: {}",
                VALID_SCREEN_MODES.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dynamic => MODE_DYNAMIC,
            Self::Static => MODE_STATIC,
        }
    }
}

impl std::fmt::Display for ScreenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a display name: trimmed non-empty and at most [`MAX_NAME_LEN`]
/// characters.
pub fn validate_name(entity: &str, name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!(
            "{entity} name must not be empty"
        )));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{entity} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the mode-dependent half of a screen configuration.
///
/// - **dynamic**: `template_id` required, no `static_asset_id`, product ids
///   unique and at most [`MAX_PRODUCTS_PER_SCREEN`].
/// - **static**: `static_asset_id` required, no `template_id`, no products.
pub fn validate_screen_config(
    mode: ScreenMode,
    template_id: Option<DbId>,
    static_asset_id: Option<DbId>,
    product_ids: &[DbId],
) -> Result<(), CoreError> {
    match mode {
        ScreenMode::Dynamic => {
            if template_id.is_none() {
                return Err(CoreError::Validation(
                    "Dynamic screens require a template_id".into(),
                ));
            }
            if static_asset_id.is_some() {
                return Err(CoreError::Validation(
                    "Dynamic screens cannot reference a static asset".into(),
                ));
            }
            if product_ids.len() > MAX_PRODUCTS_PER_SCREEN {
                return Err(CoreError::Validation(format!(
                    "A screen can list at most {MAX_PRODUCTS_PER_SCREEN} products"
                )));
            }
            let mut seen = HashSet::with_capacity(product_ids.len());
            if let Some(dup) = product_ids.iter().find(|id| !seen.insert(**id)) {
                return Err(CoreError::Validation(format!(
                    "Product {dup} appears more than once in the screen product list"
                )));
            }
            Ok(())
        }
        ScreenMode::Static => {
            if static_asset_id.is_none() {
                return Err(CoreError::Validation(
                    "Static screens require a static_asset_id".into(),
                ));
            }
            if template_id.is_some() {
                return Err(CoreError::Validation(
                    "Static screens cannot reference a template".into(),
                ));
            }
            if !product_ids.is_empty() {
                return Err(CoreError::Validation(
                    "Static screens cannot list products".into(),
                ));
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// The mode-dependent part of a screen, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenConfig {
    pub mode: ScreenMode,
    pub template_id: Option<DbId>,
    pub static_asset_id: Option<DbId>,
    pub product_ids: Vec<DbId>,
}

/// Partial update of a [`ScreenConfig`]; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ScreenConfigPatch {
    pub mode: Option<ScreenMode>,
    pub template_id: Option<DbId>,
    pub static_asset_id: Option<DbId>,
    pub product_ids: Option<Vec<DbId>>,
}

impl ScreenConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_screen_config(
            self.mode,
            self.template_id,
            self.static_asset_id,
            &self.product_ids,
        )
    }

    /// Merge a patch into the current configuration and validate the result.
    ///
    /// The resulting mode decides which half survives: a static screen drops
    /// its template and products, a dynamic screen drops its static asset.
    pub fn apply_patch(&self, patch: ScreenConfigPatch) -> Result<ScreenConfig, CoreError> {
        let mode = patch.mode.unwrap_or(self.mode);
        let merged = match mode {
            ScreenMode::Dynamic => {
                if patch.static_asset_id.is_some() {
                    return Err(CoreError::Validation(
                        "Dynamic screens cannot reference a static asset".into(),
                    ));
                }
                ScreenConfig {
                    mode,
                    template_id: patch.template_id.or(self.template_id),
                    static_asset_id: None,
                    product_ids: patch
                        .product_ids
                        .unwrap_or_else(|| self.product_ids.clone()),
                }
            }
            ScreenMode::Static => {
                if patch.template_id.is_some() {
                    return Err(CoreError::Validation(
                        "Static screens cannot reference a template".into(),
                    ));
                }
                if patch.product_ids.as_ref().is_some_and(|ids| !ids.is_empty()) {
                    return Err(CoreError::Validation(
                        "Static screens cannot list products".into(),
                    ));
                }
                ScreenConfig {
                    mode,
                    template_id: None,
                    static_asset_id: patch.static_asset_id.or(self.static_asset_id),
                    product_ids: Vec::new(),
                }
            }
        };
        merged.validate()?;
        Ok(merged)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_modes() {
        assert_eq!(ScreenMode::parse("dynamic").unwrap(), ScreenMode::Dynamic);
        assert_eq!(ScreenMode::parse("static").unwrap(), ScreenMode::Static);
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        let err = ScreenMode::parse("carousel").unwrap_err();
        assert!(err.to_string().contains("carousel"));
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&ScreenMode::Static).unwrap();
        assert_eq!(json, "\"static\"");
    }

    #[test]
    fn name_must_not_be_blank() {
        assert!(validate_name("Screen", "   ").is_err());
        assert!(validate_name("Screen", "Lobby").is_ok());
    }

    #[test]
    fn name_length_is_capped() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name("Location", &long).is_err());
        let exact = "x".repeat(MAX_NAME_LEN);
        assert!(validate_name("Location", &exact).is_ok());
    }

    // -- Dynamic --

    #[test]
    fn dynamic_requires_template() {
        assert!(validate_screen_config(ScreenMode::Dynamic, None, None, &[]).is_err());
    }

    #[test]
    fn dynamic_with_template_and_products_is_valid() {
        assert!(validate_screen_config(ScreenMode::Dynamic, Some(1), None, &[3, 1, 2]).is_ok());
    }

    #[test]
    fn dynamic_rejects_static_asset() {
        assert!(validate_screen_config(ScreenMode::Dynamic, Some(1), Some(9), &[]).is_err());
    }

    #[test]
    fn dynamic_rejects_duplicate_products() {
        let err = validate_screen_config(ScreenMode::Dynamic, Some(1), None, &[4, 5, 4])
            .unwrap_err();
        assert!(err.to_string().contains("Product 4"));
    }

    #[test]
    fn dynamic_rejects_too_many_products() {
        let ids: Vec<DbId> = (0..=MAX_PRODUCTS_PER_SCREEN as DbId).collect();
        assert!(validate_screen_config(ScreenMode::Dynamic, Some(1), None, &ids).is_err());
    }

    // -- Static --

    #[test]
    fn static_requires_asset() {
        assert!(validate_screen_config(ScreenMode::Static, None, None, &[]).is_err());
    }

    #[test]
    fn static_with_asset_is_valid() {
        assert!(validate_screen_config(ScreenMode::Static, None, Some(2), &[]).is_ok());
    }

    #[test]
    fn static_rejects_template_and_products() {
        assert!(validate_screen_config(ScreenMode::Static, Some(1), Some(2), &[]).is_err());
        assert!(validate_screen_config(ScreenMode::Static, None, Some(2), &[1]).is_err());
    }

    // -- Patching --

    fn dynamic_config() -> ScreenConfig {
        ScreenConfig {
            mode: ScreenMode::Dynamic,
            template_id: Some(1),
            static_asset_id: None,
            product_ids: vec![10, 11],
        }
    }

    #[test]
    fn empty_patch_keeps_config() {
        let config = dynamic_config();
        let merged = config.apply_patch(ScreenConfigPatch::default()).unwrap();
        assert_eq!(merged, config);
    }

    #[test]
    fn patch_replaces_product_list() {
        let merged = dynamic_config()
            .apply_patch(ScreenConfigPatch {
                product_ids: Some(vec![12]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(merged.product_ids, vec![12]);
        assert_eq!(merged.template_id, Some(1));
    }

    #[test]
    fn switching_to_static_drops_template_and_products() {
        let merged = dynamic_config()
            .apply_patch(ScreenConfigPatch {
                mode: Some(ScreenMode::Static),
                static_asset_id: Some(5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(merged.template_id, None);
        assert!(merged.product_ids.is_empty());
        assert_eq!(merged.static_asset_id, Some(5));
    }

    #[test]
    fn switching_to_static_without_asset_fails() {
        let result = dynamic_config().apply_patch(ScreenConfigPatch {
            mode: Some(ScreenMode::Static),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn switching_to_dynamic_drops_asset() {
        let config = ScreenConfig {
            mode: ScreenMode::Static,
            template_id: None,
            static_asset_id: Some(5),
            product_ids: Vec::new(),
        };
        let merged = config
            .apply_patch(ScreenConfigPatch {
                mode: Some(ScreenMode::Dynamic),
                template_id: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(merged.static_asset_id, None);
        assert_eq!(merged.template_id, Some(2));
    }

    #[test]
    fn static_patch_with_products_is_rejected() {
        let config = ScreenConfig {
            mode: ScreenMode::Static,
            template_id: None,
            static_asset_id: Some(5),
            product_ids: Vec::new(),
        };
        let result = config.apply_patch(ScreenConfigPatch {
            product_ids: Some(vec![1]),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
