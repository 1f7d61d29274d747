//! Module identification from region names

/// The module a region most likely belongs to, inferred from its name.
///
/// Debuggers commonly name regions after the file they were mapped from and
/// the base address it was loaded at, e.g. `Memory[/bin/echo 0x55550000]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleKey {
    path: String,
}

impl ModuleKey {
    /// The embedded file path, e.g. `/bin/echo`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The file name without any directories, e.g. `echo`.
    pub fn basename(&self) -> &str {
        self.path
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.path)
    }

    /// The file name up to its first dot, e.g. `libc` for `libc.so.6`.
    pub fn stem(&self) -> &str {
        let basename = self.basename();

        match basename.find('.') {
            Some(0) | None => basename,
            Some(dot) => &basename[..dot],
        }
    }
}

/// Extract a module key from a region name.
///
/// The name is expected to hold a file path followed by whitespace and a
/// hexadecimal base address (with or without `0x`), optionally wrapped in
/// a `Prefix[...]` decoration. Anything else yields `None`, meaning the region
/// cannot be attributed to a module.
pub fn module_key(region_name: &str) -> Option<ModuleKey> {
    let inner = match (region_name.find('['), region_name.rfind(']')) {
        (Some(open), Some(close)) if open < close => &region_name[open + 1..close],
        _ => region_name,
    };
    let inner = inner.trim();

    let split = inner.rfind(char::is_whitespace)?;
    let path = inner[..split].trim();
    let base = inner[split..].trim();
    let base = base
        .strip_prefix("0x")
        .or_else(|| base.strip_prefix("0X"))
        .unwrap_or(base);

    if path.is_empty() || base.is_empty() {
        return None;
    }

    u64::from_str_radix(base, 16).ok()?;

    Some(ModuleKey {
        path: path.to_string(),
    })
}
