//! Asset name derivation.
//!
//! Inventory entries need a human-usable, filesystem-safe name. Strategies
//! are tried in order; the first that produces a name wins, and the
//! synthetic `{Kind}_{object_id}` fallback always succeeds, so every asset
//! gets a name even when its payload could not be read.

use crate::assets::{AssetData, AssetKind};
use crate::file_safety::sanitize_filename;

/// Inputs available to naming strategies.
#[derive(Debug, Clone, Copy)]
pub struct NameContext<'a> {
    pub kind: AssetKind,
    pub object_id: u64,
    /// Materialized payload; `None` when the object's read failed.
    pub data: Option<&'a AssetData>,
}

type NameStrategy = fn(&NameContext<'_>) -> Option<String>;

/// Ordered strategy chain. Order matters: an explicit name beats the owning
/// object's name, which beats a declared class name.
const STRATEGIES: &[NameStrategy] = &[explicit_name, owner_name, class_name];

/// Derive a sanitized display name for an asset.
pub fn derive_name(ctx: &NameContext<'_>) -> String {
    for strategy in STRATEGIES {
        if let Some(name) = strategy(ctx) {
            let name = sanitize_filename(&name);
            if name != "unnamed" {
                return name;
            }
        }
    }
    synthetic_name(ctx.kind, ctx.object_id)
}

/// Guaranteed fallback name.
pub fn synthetic_name(kind: AssetKind, object_id: u64) -> String {
    format!("{}_{}", kind.label(), object_id)
}

/// The name the payload itself carries.
fn explicit_name(ctx: &NameContext<'_>) -> Option<String> {
    ctx.data?.name().map(str::to_string)
}

/// Name of the owning object, suffixed with the kind label so sibling
/// components attached to the same owner stay distinguishable.
fn owner_name(ctx: &NameContext<'_>) -> Option<String> {
    let owner = ctx.data?.owner_name()?;
    Some(format!("{}_{}", owner, ctx.kind.label()))
}

/// Declared class name, for script-like payloads.
fn class_name(ctx: &NameContext<'_>) -> Option<String> {
    ctx.data?.class_name().map(str::to_string)
}
