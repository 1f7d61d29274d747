//! Region permission flags

use bitflags::bitflags;
use std::fmt;
use std::str;

bitflags! {
    /// The permissions a trace region was mapped with.
    #[derive(Default)]
    pub struct MemoryFlags: u8 {
        const READ = 0b001;
        const WRITE = 0b010;
        const EXECUTE = 0b100;
    }
}

impl fmt::Display for MemoryFlags {
    /// Render flags the way `/proc/pid/maps` does, e.g. `r-x`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.contains(MemoryFlags::READ) { 'r' } else { '-' };
        let w = if self.contains(MemoryFlags::WRITE) { 'w' } else { '-' };
        let x = if self.contains(MemoryFlags::EXECUTE) { 'x' } else { '-' };

        write!(f, "{}{}{}", r, w, x)
    }
}

impl str::FromStr for MemoryFlags {
    type Err = ();

    /// Parse a permission string such as `rw-` or `rx`.
    ///
    /// Letters may appear in any order and dashes are ignored. Any other
    /// character is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = MemoryFlags::empty();

        for c in s.chars() {
            match c.to_ascii_lowercase() {
                'r' => flags |= MemoryFlags::READ,
                'w' => flags |= MemoryFlags::WRITE,
                'x' => flags |= MemoryFlags::EXECUTE,
                '-' => {}
                _ => return Err(()),
            }
        }

        Ok(flags)
    }
}

derive_serialize_from_display!(MemoryFlags);
derive_deserialize_from_str!(MemoryFlags, "valid permission string");
