//! On-disk caching of inferred key maps.
//!
//! Key map inference is slow (two full passes over every probe key), so the
//! result is persisted and reused by later sessions. A cached map is only
//! trusted when it is recent and plausibly complete; anything else is
//! silently discarded and the map is regenerated. Cache failures are never
//! fatal.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use log::{debug, info};
use xoanon_core::KeyMap;

/// The minimum number of entries a cached key map must contain to be
/// considered plausibly complete.
pub const KEY_MAP_CACHE_MINIMUM: usize = 88;

/// Cached maps older than this are regenerated.
const KEY_MAP_CACHE_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// The clock used to judge cache file age. Injectable for tests.
pub type CacheClock = Box<dyn Fn() -> SystemTime + Send + Sync>;

/// A cache of inferred key maps, stored at `<directory>/xoanon/keymap.bin`.
pub struct KeyMapCache {
    directory: PathBuf,
    clock: CacheClock,
}

impl KeyMapCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_clock(directory, Box::new(SystemTime::now))
    }

    /// A cache rooted at the system temporary directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn with_clock(directory: impl Into<PathBuf>, clock: CacheClock) -> Self {
        Self {
            directory: directory.into(),
            clock,
        }
    }

    /// The cache file path.
    pub fn path(&self) -> PathBuf {
        self.directory.join("xoanon").join("keymap.bin")
    }

    /// Load a cached key map, or `None` if the cache is absent, stale,
    /// corrupt, or implausibly small.
    pub fn load(&self) -> Option<KeyMap> {
        match self.load_inner() {
            Ok(map) => map,
            Err(e) => {
                debug!("unable to read key map cache: {e}");
                None
            }
        }
    }

    fn load_inner(&self) -> io::Result<Option<KeyMap>> {
        let file = self.path();
        let modified = fs::metadata(&file)?.modified()?;
        if let Ok(age) = (self.clock)().duration_since(modified) {
            if age > KEY_MAP_CACHE_MAX_AGE {
                info!(
                    "key map cache {} is older than one hour; ignoring it",
                    file.display()
                );
                return Ok(None);
            }
        }

        let bytes = fs::read(&file)?;
        let map: KeyMap = match bincode::deserialize(&bytes) {
            Ok(map) => map,
            Err(e) => {
                info!("key map cache {} is unreadable: {e}", file.display());
                return Ok(None);
            }
        };
        if map.len() < KEY_MAP_CACHE_MINIMUM {
            info!(
                "key map cache {} only contains {} keys; ignoring it",
                file.display(),
                map.len()
            );
            return Ok(None);
        }

        info!(
            "loaded key map cache {} ({} keys)",
            file.display(),
            map.len()
        );
        Ok(Some(map))
    }

    /// Write the given key map to the cache. Failures are logged and
    /// swallowed; a session works fine without a cache.
    pub fn save(&self, map: &KeyMap) {
        if let Err(e) = self.save_inner(map) {
            debug!("unable to write key map cache: {e}");
        }
    }

    fn save_inner(&self, map: &KeyMap) -> io::Result<()> {
        let file = self.path();
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serialize(map).map_err(io::Error::other)?;
        fs::write(&file, bytes)?;
        info!(
            "wrote key map cache {} ({} keys)",
            file.display(),
            map.len()
        );
        Ok(())
    }
}
