/// Extension-based categorization of files.
///
/// A [`CategoryTable`] maps lowercase file extensions to category names, the
/// names of the folders files are sorted into. Lookups never fail: an
/// extension the table does not know resolves to the fallback category.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::CategoryTable;
///
/// let table = CategoryTable::standard();
/// assert_eq!(table.resolve("pdf"), "Documents");
/// assert_eq!(table.resolve("JPG"), "Images");
/// assert_eq!(table.resolve("nope"), "Other");
/// ```
use crate::error::ConfigError;
use std::collections::HashMap;

/// Name of the fallback category in the standard table.
pub const DEFAULT_FALLBACK: &str = "Other";

/// Built-in category groups, in declaration order.
const STANDARD_GROUPS: &[(&str, &[&str])] = &[
    (
        "Documents",
        &["pdf", "doc", "docx", "odt", "rtf", "tex", "txt", "wpd", "pages"],
    ),
    ("Spreadsheets", &["xls", "xlsx", "xlsm", "ods", "csv"]),
    ("Presentations", &["ppt", "pptx", "odp", "key"]),
    (
        "Images",
        &[
            "png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "tiff", "ico", "heic",
        ],
    ),
    (
        "Videos",
        &[
            "mp4", "mov", "avi", "flv", "wmv", "mkv", "webm", "m4v", "mpg", "mpeg", "3gp",
        ],
    ),
    (
        "Audio",
        &[
            "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "aiff", "mid", "midi",
        ],
    ),
    ("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2", "iso"]),
    ("Executables", &["exe", "msi", "app", "apk", "dmg"]),
    (
        "Code",
        &[
            "py", "java", "cpp", "c", "h", "swift", "json", "sql", "rb", "go", "kt", "ts",
        ],
    ),
    (
        "Design",
        &["ai", "ps", "eps", "xd", "fig", "indd", "cdr", "sketch"],
    ),
    ("Ebooks", &["epub", "mobi", "azw", "azw3", "fb2"]),
    ("Fonts", &["ttf", "otf", "woff", "woff2", "eot"]),
    ("System", &["dll", "sys", "ini", "cfg"]),
    ("Torrents", &["torrent"]),
    ("Logs", &["log", "txtlog"]),
    ("Temp Files", &["tmp", "bak", "old"]),
    (
        "Config Files",
        &["yml", "yaml", "toml", "env", "conf", "properties"],
    ),
    (
        "Game Files",
        &["unitypackage", "asset", "prefab", "material"],
    ),
    ("CAD Files", &["stl", "obj", "fbx", "dae", "3ds"]),
    ("Scripts", &["sh", "bat", "ps1", "cmd"]),
    ("Database", &["db", "sqlite", "mdb", "accdb"]),
    ("Web Files", &["html", "css", "js", "php", "xml"]),
];

/// Immutable mapping from extension to category name.
///
/// Every category an extension maps to is a member of [`CategoryTable::categories`],
/// and so is the fallback.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extension_map: HashMap<String, String>,
    categories: Vec<String>,
    fallback: String,
}

impl CategoryTable {
    /// The built-in table with `"Other"` as fallback.
    pub fn standard() -> Self {
        Self::from_groups(Self::standard_groups(), DEFAULT_FALLBACK)
            .expect("built-in category table is valid")
    }

    fn standard_groups() -> Vec<(String, Vec<String>)> {
        STANDARD_GROUPS
            .iter()
            .map(|(name, exts)| {
                (
                    name.to_string(),
                    exts.iter().map(|ext| ext.to_string()).collect(),
                )
            })
            .collect()
    }

    /// Builds a table from `(category, extensions)` groups.
    ///
    /// Extensions are lowercased and may carry a leading dot. A category may
    /// have no extensions at all; it is still a known category.
    ///
    /// # Errors
    ///
    /// Fails on an unusable category name, an empty extension, or an extension
    /// listed under two different categories.
    pub fn from_groups<I, E>(groups: I, fallback: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, E)>,
        E: IntoIterator<Item = String>,
    {
        validate_category_name(fallback)?;

        let mut table = Self {
            extension_map: HashMap::new(),
            categories: Vec::new(),
            fallback: fallback.to_string(),
        };

        for (category, extensions) in groups {
            validate_category_name(&category)?;
            for ext in extensions {
                let ext = normalize_extension(&ext);
                if ext.is_empty() {
                    return Err(ConfigError::EmptyExtension(category));
                }
                if let Some(first) = table.extension_map.get(&ext)
                    && first != &category
                {
                    return Err(ConfigError::DuplicateExtension {
                        extension: ext,
                        first: first.clone(),
                        second: category,
                    });
                }
                table.extension_map.insert(ext, category.clone());
            }
            table.add_category(category);
        }

        // Fallback always closes the list.
        table.categories.retain(|name| name != fallback);
        table.categories.push(table.fallback.clone());
        Ok(table)
    }

    /// Returns the standard table extended with `groups`.
    ///
    /// An extension listed in `groups` is reassigned to its new category; a
    /// new category name is appended to the known set.
    ///
    /// # Errors
    ///
    /// Same validation as [`CategoryTable::from_groups`], applied to `groups`.
    pub fn with_overrides<I, E>(groups: I, fallback: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, E)>,
        E: IntoIterator<Item = String>,
    {
        let overrides = Self::from_groups(groups, fallback)?;
        let mut merged = Self::from_groups(Self::standard_groups(), fallback)?;

        for (ext, category) in overrides.extension_map {
            merged.extension_map.insert(ext, category);
        }
        for category in overrides.categories {
            merged.add_category(category);
        }
        merged.categories.retain(|name| name != fallback);
        merged.categories.push(merged.fallback.clone());
        Ok(merged)
    }

    fn add_category(&mut self, category: String) {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }

    /// Resolves an extension to its category, ignoring case.
    ///
    /// ```
    /// use dirsort::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::standard();
    /// assert_eq!(table.resolve("ZIP"), "Archives");
    /// assert_eq!(table.resolve(".zip"), "Archives");
    /// assert_eq!(table.resolve(""), "Other");
    /// ```
    pub fn resolve(&self, extension: &str) -> &str {
        self.extension_map
            .get(&normalize_extension(extension))
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    /// The fallback category for unknown extensions.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// All known categories in declaration order, fallback last.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Returns true if `extension` has an explicit entry.
    pub fn contains_extension(&self, extension: &str) -> bool {
        self.extension_map
            .contains_key(&normalize_extension(extension))
    }

    /// Iterates over all `(extension, category)` entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extension_map
            .iter()
            .map(|(ext, category)| (ext.as_str(), category.as_str()))
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn validate_category_name(name: &str) -> Result<(), ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0')
    {
        return Err(ConfigError::InvalidCategoryName(name.to_string()));
    }
    Ok(())
}
