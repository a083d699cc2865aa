//! XML schema validation through libxml2.
//!
//! XSD schemas go through the `libxml` crate's schema contexts. RelaxNG
//! schemas use libxml2's RelaxNG entry points directly, as the crate only
//! wraps XSD. Validation contexts are built per call: libxml2 handles are
//! tied to the calling thread, while a [`XmlValidator`] is shared across
//! batch workers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use libxml::error::StructuredError;
use libxml::parser::Parser;
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};
use libxml::tree::Document as LibxmlDocument;
use roxmltree::Document;

use crate::error::{ParserError, Result};

/// Compiled validators keyed by schema path and kind.
static VALIDATOR_CACHE: LazyLock<Mutex<HashMap<(PathBuf, SchemaKind), Arc<XmlValidator>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Supported schema languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Xsd,
    RelaxNg,
}

impl SchemaKind {
    /// Parse a kind name (`xsd`, `relaxng` or `rng`).
    ///
    /// # Examples
    /// ```
    /// use legaljson::xml::schema::SchemaKind;
    ///
    /// assert_eq!(SchemaKind::parse("XSD").unwrap(), SchemaKind::Xsd);
    /// assert_eq!(SchemaKind::parse("rng").unwrap(), SchemaKind::RelaxNg);
    /// assert!(SchemaKind::parse("dtd").is_err());
    /// ```
    pub fn parse(kind: &str) -> Result<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "xsd" => Ok(Self::Xsd),
            "relaxng" | "rng" => Ok(Self::RelaxNg),
            other => Err(ParserError::ParserConfiguration(format!(
                "Unsupported schema type: '{other}'. Expected 'xsd' or 'relaxng'"
            ))),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xsd => "xsd",
            Self::RelaxNg => "relaxng",
        }
    }
}

#[derive(Debug, Clone)]
struct LoadedSchema {
    kind: SchemaKind,
    path: String,
}

/// Validator for XML trees. Starts empty; see [`XmlValidator::load_schema`].
#[derive(Debug, Clone, Default)]
pub struct XmlValidator {
    schema: Option<LoadedSchema>,
}

impl XmlValidator {
    /// Create a validator with no schema loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator and load `path` into it.
    pub fn from_file(path: &Path, kind: &str) -> Result<Self> {
        let mut validator = Self::new();
        validator.load_schema(path, kind)?;
        Ok(validator)
    }

    /// Kind of the loaded schema, if any.
    #[must_use]
    pub fn kind(&self) -> Option<SchemaKind> {
        self.schema.as_ref().map(|s| s.kind)
    }

    /// Load and compile a schema file, replacing any previous one.
    ///
    /// # Errors
    /// * `FileLoad` if the file cannot be read
    /// * `ParserConfiguration` if the kind is unknown or the schema does not compile
    pub fn load_schema(&mut self, path: &Path, kind: &str) -> Result<()> {
        let kind = SchemaKind::parse(kind)?;
        std::fs::metadata(path)
            .and_then(|meta| {
                if meta.is_file() {
                    Ok(())
                } else {
                    Err(std::io::Error::other("not a regular file"))
                }
            })
            .map_err(|source| ParserError::FileLoad {
                path: path.to_path_buf(),
                source,
            })?;

        let malformed = |errors: Vec<String>| {
            ParserError::ParserConfiguration(format!(
                "Malformed {} schema {}: {}",
                kind.as_str(),
                path.display(),
                errors.join("; ")
            ))
        };

        let schema = LoadedSchema {
            kind,
            path: path
                .to_str()
                .ok_or_else(|| malformed(vec!["path is not valid UTF-8".to_string()]))?
                .to_string(),
        };
        schema.compile().map_err(malformed)?;

        tracing::info!(path = %path.display(), kind = kind.as_str(), "Schema loaded");
        self.schema = Some(schema);
        Ok(())
    }

    /// Validate a tree against the loaded schema.
    ///
    /// # Errors
    /// * `ParserConfiguration` if no schema is loaded
    /// * `SchemaValidation` with one `Line N: ...` message per libxml2 diagnostic
    pub fn validate(&self, doc: &Document<'_>) -> Result<()> {
        self.validate_str(doc.input_text())
    }

    /// Validate XML source text against the loaded schema.
    pub fn validate_str(&self, source: &str) -> Result<()> {
        let schema = self.schema.as_ref().ok_or_else(|| {
            ParserError::ParserConfiguration("No schema loaded for validation".to_string())
        })?;

        let document = Parser::default()
            .parse_string(source)
            .map_err(|err| ParserError::Validation(format!("libxml2 rejected the input: {err:?}")))?;

        schema
            .check(&document)
            .map_err(|errors| ParserError::SchemaValidation { errors })
    }
}

/// Compiled form of a loaded schema, alive for one validation.
enum Compiled {
    Xsd(SchemaValidationContext),
    RelaxNg(relaxng::RelaxNgSchema),
}

impl LoadedSchema {
    fn compile(&self) -> std::result::Result<Compiled, Vec<String>> {
        match self.kind {
            SchemaKind::Xsd => {
                let mut parser = SchemaParserContext::from_file(&self.path);
                SchemaValidationContext::from_parser(&mut parser)
                    .map(Compiled::Xsd)
                    .map_err(|errors| errors.iter().map(describe).collect())
            }
            SchemaKind::RelaxNg => relaxng::RelaxNgSchema::from_file(&self.path)
                .map(Compiled::RelaxNg)
                .map_err(|error| vec![error]),
        }
    }

    fn check(&self, document: &LibxmlDocument) -> std::result::Result<(), Vec<String>> {
        match self.compile() {
            Ok(Compiled::Xsd(mut context)) => context
                .validate_document(document)
                .map_err(|errors| errors.iter().map(describe).collect()),
            Ok(Compiled::RelaxNg(schema)) => schema.validate(document).map_err(|error| vec![error]),
            Err(errors) => Err(errors),
        }
    }
}

/// Render a libxml2 diagnostic as `Line N: message`.
fn describe(error: &StructuredError) -> String {
    let message = error
        .message
        .as_deref()
        .map_or("unknown schema error", str::trim);
    match error.line {
        Some(line) => format!("Line {line}: {message}"),
        None => message.to_string(),
    }
}

mod relaxng {
    use std::ffi::{c_char, c_int, CStr, CString};

    use libxml::bindings::{xmlDocPtr, xmlGetLastError, xmlResetLastError};
    use libxml::tree::Document;

    #[repr(C)]
    struct ParserCtxt {
        _private: [u8; 0],
    }

    #[repr(C)]
    struct ValidCtxt {
        _private: [u8; 0],
    }

    #[repr(C)]
    struct Schema {
        _private: [u8; 0],
    }

    extern "C" {
        fn xmlRelaxNGNewParserCtxt(url: *const c_char) -> *mut ParserCtxt;
        fn xmlRelaxNGParse(ctxt: *mut ParserCtxt) -> *mut Schema;
        fn xmlRelaxNGFreeParserCtxt(ctxt: *mut ParserCtxt);
        fn xmlRelaxNGFree(schema: *mut Schema);
        fn xmlRelaxNGNewValidCtxt(schema: *mut Schema) -> *mut ValidCtxt;
        fn xmlRelaxNGValidateDoc(ctxt: *mut ValidCtxt, doc: xmlDocPtr) -> c_int;
        fn xmlRelaxNGFreeValidCtxt(ctxt: *mut ValidCtxt);
    }

    /// Parsed RelaxNG grammar owned by the current thread.
    pub(super) struct RelaxNgSchema {
        schema: *mut Schema,
    }

    impl RelaxNgSchema {
        pub(super) fn from_file(path: &str) -> Result<Self, String> {
            let url = CString::new(path).map_err(|e| e.to_string())?;
            // SAFETY: the parser context is freed before returning and the
            // schema pointer is owned by the returned value.
            unsafe {
                xmlResetLastError();
                let parser = xmlRelaxNGNewParserCtxt(url.as_ptr());
                if parser.is_null() {
                    return Err(last_error("cannot create RelaxNG parser"));
                }
                let schema = xmlRelaxNGParse(parser);
                xmlRelaxNGFreeParserCtxt(parser);
                if schema.is_null() {
                    return Err(last_error("RelaxNG grammar does not compile"));
                }
                Ok(Self { schema })
            }
        }

        pub(super) fn validate(&self, document: &Document) -> Result<(), String> {
            // SAFETY: `document` keeps its tree alive for the call and the
            // validation context is freed before returning.
            unsafe {
                xmlResetLastError();
                let ctxt = xmlRelaxNGNewValidCtxt(self.schema);
                if ctxt.is_null() {
                    return Err(last_error("cannot create RelaxNG validation context"));
                }
                let status = xmlRelaxNGValidateDoc(ctxt, document.doc_ptr());
                xmlRelaxNGFreeValidCtxt(ctxt);
                if status == 0 {
                    Ok(())
                } else {
                    Err(last_error("document does not match the RelaxNG grammar"))
                }
            }
        }
    }

    impl Drop for RelaxNgSchema {
        fn drop(&mut self) {
            // SAFETY: the pointer came from xmlRelaxNGParse and is freed once.
            unsafe { xmlRelaxNGFree(self.schema) }
        }
    }

    /// Last libxml2 error of this thread as `Line N: message`.
    fn last_error(fallback: &str) -> String {
        // SAFETY: libxml2 returns null or a pointer to its thread-local error.
        let Some(error) = (unsafe { xmlGetLastError().as_ref() }) else {
            return fallback.to_string();
        };
        if error.message.is_null() {
            return fallback.to_string();
        }
        // SAFETY: a non-null message is a NUL-terminated C string.
        let message = unsafe { CStr::from_ptr(error.message) }.to_string_lossy();
        if error.line > 0 {
            format!("Line {}: {}", error.line, message.trim())
        } else {
            message.trim().to_string()
        }
    }
}

/// Load a validator once per (path, kind) and share it afterwards.
pub fn cached_validator(path: &Path, kind: &str) -> Result<Arc<XmlValidator>> {
    let schema_kind = SchemaKind::parse(kind)?;
    let key = (path.to_path_buf(), schema_kind);

    let mut cache = VALIDATOR_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(validator) = cache.get(&key) {
        return Ok(Arc::clone(validator));
    }

    let validator = Arc::new(XmlValidator::from_file(path, kind)?);
    cache.insert(key, Arc::clone(&validator));
    Ok(validator)
}
