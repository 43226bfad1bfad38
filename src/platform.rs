//! Platform probing used by rule evaluation and JVM manifest lookup.
//!
//! The probed values are the identifiers Mojang metadata uses, not the Rust
//! target names. Everything here is derived from compile-time constants
//! except the OS version string which is probed once per process. Unknown
//! values propagate as `None` so that downstream steps can skip OS-gated
//! items or fail with a typed error.

use std::sync::LazyLock;
use std::env;


/// Return the OS identifier used in rules matching: `linux`, `windows` or
/// `osx`, none if the OS is not one Mojang metadata knows about.
#[inline]
pub fn os_name() -> Option<&'static str> {
    Some(match env::consts::OS {
        "linux" => "linux",
        "windows" => "windows",
        "macos" => "osx",
        _ => return None
    })
}

/// Return the architecture identifier used in rules matching: `x86` or
/// `x86_64`.
#[inline]
pub fn os_arch() -> Option<&'static str> {
    Some(match env::consts::ARCH {
        "x86" => "x86",
        "x86_64" => "x86_64",
        _ => return None
    })
}

/// Return the address width of the architecture, `"32"` or `"64"`, as
/// substituted into natives classifiers through the `${arch}` token.
#[inline]
pub fn os_bits() -> Option<&'static str> {
    Some(match env::consts::ARCH {
        "x86" => "32",
        "x86_64" => "64",
        _ => return None
    })
}

/// Return the platform key used to index the Mojang JVM meta manifest.
#[inline]
pub fn jvm_platform() -> Option<&'static str> {
    Some(match (os_name()?, os_arch()?) {
        ("osx", "x86") => "mac-os",
        ("linux", "x86") => "linux-i386",
        ("linux", "x86_64") => "linux",
        ("windows", "x86") => "windows-x86",
        ("windows", "x86_64") => "windows-x64",
        _ => return None
    })
}

/// Return the OS version string matched by the `os.version` rule regex.
#[inline]
pub fn os_version() -> Option<&'static str> {

    static VERSION: LazyLock<Option<String>> = LazyLock::new(|| {
        use os_info::Version;
        match os_info::get().version() {
            Version::Unknown => None,
            version => Some(version.to_string())
        }
    });

    VERSION.as_deref()

}

/// Return the JVM executable file name for the current OS.
#[inline]
pub(crate) fn jvm_exec_name() -> &'static str {
    if cfg!(windows) { "javaw.exe" } else { "java" }
}
