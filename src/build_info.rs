mod raw {
    // The constants are generated by the `built` crate in build.rs.
    // See https://docs.rs/built/latest/built/index.html for the full list.
    // We only use a few of them: PKG_VERSION, FEATURES_STR, GIT_COMMIT_HASH and GIT_DIRTY.
    #![allow(dead_code)]

    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Crate version such as 0.31.0
pub const BARRIER_SET_PKG_VERSION: &str = raw::PKG_VERSION;

/// Comma separated features enabled for this build
pub const BARRIER_SET_FEATURES: &str = raw::FEATURES_STR;

lazy_static! {
    /// Git version such as a96e8f991c91a81df51e7975849441f52fdbcdcc, or a96e8f991c91a81df51e7975849441f52fdbcdcc-dirty, or unknown-git-version if
    /// the crate is not built from a git repo.
    pub static ref BARRIER_SET_GIT_VERSION: &'static str = &BARRIER_SET_GIT_VERSION_STRING;

    // Owned string
    static ref BARRIER_SET_GIT_VERSION_STRING: String = match (raw::GIT_COMMIT_HASH, raw::GIT_DIRTY) {
        (Some(hash), Some(dirty)) => format!("{}{}", hash, if dirty { "-dirty" } else { "" }),
        (Some(hash), None) => hash.to_string(),
        _ => "unknown-git-version".to_string(),
    };
}
