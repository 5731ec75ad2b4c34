//! Provider selection.

use super::models::Provider;

/// Pick the preferred provider by exact id or case-insensitive name,
/// falling back to the first one listed.
pub fn pick_provider<'a>(providers: &'a [Provider], preferred: Option<&str>) -> Option<&'a Provider> {
    preferred
        .filter(|p| !p.is_empty())
        .and_then(|wanted| {
            providers
                .iter()
                .find(|p| p.id == wanted || p.name.eq_ignore_ascii_case(wanted))
        })
        .or_else(|| providers.first())
}

/// Like [`pick_provider`], but without an explicit match the fallback is the
/// first provider that advertises embedding models.
pub fn pick_embedding_provider<'a>(
    providers: &'a [Provider],
    preferred: Option<&str>,
) -> Option<&'a Provider> {
    if let Some(wanted) = preferred.filter(|p| !p.is_empty()) {
        if let Some(found) = providers
            .iter()
            .find(|p| p.id == wanted || p.name.eq_ignore_ascii_case(wanted))
        {
            return Some(found);
        }
    }

    providers
        .iter()
        .find(|p| p.has_embedding_models())
        .or_else(|| providers.first())
}
