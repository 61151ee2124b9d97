//! Storage key resolution
//!
//! A key is `{base path}/{filename}`. The base path comes from a template such
//! as `uploads/{tenant}/{id}` whose placeholders are filled from record
//! attributes; the filename is the managed attribute's value.

use regex::Regex;
use std::sync::LazyLock;
use stowage_core::{AppError, AppResult, UploadTarget};

use crate::record::Record;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_.]+)\}").expect("placeholder pattern is valid")
});

pub struct PathResolver;

impl PathResolver {
    /// Fill every `{attribute}` placeholder of `template`.
    ///
    /// With `use_old`, the record's persisted values are used instead of the
    /// in-memory ones.
    pub fn resolve_template<R: Record + ?Sized>(
        template: &str,
        record: &R,
        use_old: bool,
    ) -> AppResult<String> {
        let mut resolved = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = Self::value(record, name.as_str(), use_old)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::UnresolvedPlaceholder {
                    template: template.to_string(),
                    placeholder: name.as_str().to_string(),
                })?;

            resolved.push_str(&template[last..whole.start()]);
            resolved.push_str(&value);
            last = whole.end();
        }
        resolved.push_str(&template[last..]);

        Ok(resolved.trim_matches('/').to_string())
    }

    /// Key of the target attribute's object, or `None` when the attribute holds
    /// no filename (nothing was ever attached).
    pub fn resolve<R: Record + ?Sized>(
        target: &UploadTarget,
        record: &R,
        use_old: bool,
    ) -> AppResult<Option<String>> {
        let filename = match Self::value(record, &target.attribute_name, use_old) {
            Some(filename) if !filename.is_empty() => filename,
            _ => return Ok(None),
        };
        let base = Self::resolve_template(&target.base_path_template, record, use_old)?;
        Ok(Some(Self::join(&base, &filename)))
    }

    pub fn join(base: &str, filename: &str) -> String {
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", base, filename)
        }
    }

    fn value<R: Record + ?Sized>(record: &R, name: &str, use_old: bool) -> Option<String> {
        if use_old {
            record.old_attribute(name)
        } else {
            record.attribute(name)
        }
    }
}
