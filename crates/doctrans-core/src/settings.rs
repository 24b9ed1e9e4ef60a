//! Base settings model and the per-job settings builder.
//!
//! [`BaseSettings`] is the process-wide default configuration: language pair,
//! rate limits, PDF output switches, engine selector flags and per-engine
//! detail fields. [`build_execution_config`] merges it with one job's raw
//! inputs into an immutable [`ExecutionConfig`] snapshot without mutating the
//! base, and decides whether the merged copy becomes the new persisted
//! default.
//!
//! The build is clone-then-restore: job-transient fields (output directory,
//! page selection, caller-context switches) are remembered up front and put
//! back before the working copy is eligible for persistence, so one job's
//! page range can never leak into the defaults the next job starts from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{self, EngineMetadata, FieldKind};
use crate::defaults::{DEFAULT_QPS, POOL_WORKERS_MAX, REPORT_INTERVAL_SECS};
use crate::error::{Error, Result};
use crate::inputs::{parse_bool_token, RawInputs};
use crate::language;
use crate::models::BackendKind;
use crate::rate_limit::{self, RateLimitMode};

/// A coerced engine detail value. The closed set mirrors [`FieldKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

/// Watermarking applied to produced artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkMode {
    #[default]
    Watermarked,
    NoWatermark,
    Both,
}

impl WatermarkMode {
    /// Parse the client-facing label; spaces and case are normalized so
    /// "No Watermark" and "no_watermark" both resolve.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().replace(' ', "_").as_str() {
            "watermarked" => Some(WatermarkMode::Watermarked),
            "no_watermark" => Some(WatermarkMode::NoWatermark),
            "both" => Some(WatermarkMode::Both),
            _ => None,
        }
    }
}

/// Whether a successful build persists the restored working copy as the new
/// default configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Persist unless the resolved settings disable auto-save.
    #[default]
    FollowGlobalSetting,
    Never,
    Always,
}

impl SaveMode {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().replace(' ', "_").as_str() {
            "follow_global_setting" => Some(SaveMode::FollowGlobalSetting),
            "never" => Some(SaveMode::Never),
            "always" => Some(SaveMode::Always),
            _ => None,
        }
    }
}

/// Translation-facing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub lang_in: String,
    pub lang_out: String,
    /// Artifact output directory; job-transient, restored after each build.
    pub output: Option<PathBuf>,
    pub qps: Option<u32>,
    pub pool_max_workers: Option<u32>,
    pub term_qps: Option<u32>,
    pub term_pool_max_workers: Option<u32>,
    pub min_text_length: Option<i64>,
    pub rpc_doclayout: Option<String>,
    /// Stored as a negative flag; the client switch is positive.
    pub no_auto_extract_glossary: bool,
    pub primary_font_family: Option<String>,
    pub ignore_cache: bool,
    pub custom_prompt: Option<String>,
    pub custom_system_prompt: Option<String>,
    pub glossaries: Option<String>,
    pub save_auto_extracted_glossary: bool,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        TranslationSettings {
            lang_in: "en".to_string(),
            lang_out: "zh".to_string(),
            output: None,
            qps: None,
            pool_max_workers: None,
            term_qps: None,
            term_pool_max_workers: None,
            min_text_length: None,
            rpc_doclayout: None,
            no_auto_extract_glossary: false,
            primary_font_family: None,
            ignore_cache: false,
            custom_prompt: None,
            custom_system_prompt: None,
            glossaries: None,
            save_auto_extracted_glossary: false,
        }
    }
}

/// PDF processing switches handed through to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// Comma-separated 1-indexed page list; `None` means all pages.
    /// Job-transient, restored after each build.
    pub pages: Option<String>,
    pub no_mono: bool,
    pub no_dual: bool,
    pub dual_translate_first: bool,
    pub use_alternating_pages_dual: bool,
    pub watermark_output_mode: WatermarkMode,
    pub skip_clean: bool,
    pub disable_rich_text_translate: bool,
    pub enhance_compatibility: bool,
    pub split_short_lines: bool,
    pub short_line_split_factor: f64,
    pub translate_table_text: bool,
    pub skip_scanned_detection: bool,
    pub ocr_workaround: bool,
    pub auto_enable_ocr_workaround: bool,
    pub only_include_translated_page: bool,
    pub max_pages_per_part: Option<u32>,
    pub formular_font_pattern: Option<String>,
    pub formular_char_pattern: Option<String>,
    pub no_merge_alternating_line_numbers: bool,
    pub no_remove_non_formula_lines: bool,
    pub non_formula_line_iou_threshold: f64,
    pub figure_table_protection_threshold: f64,
    pub skip_formula_offset_calculation: bool,
}

impl Default for PdfSettings {
    fn default() -> Self {
        PdfSettings {
            pages: None,
            no_mono: false,
            no_dual: false,
            dual_translate_first: false,
            use_alternating_pages_dual: false,
            watermark_output_mode: WatermarkMode::default(),
            skip_clean: false,
            disable_rich_text_translate: false,
            enhance_compatibility: false,
            split_short_lines: false,
            short_line_split_factor: 0.8,
            translate_table_text: false,
            skip_scanned_detection: false,
            ocr_workaround: false,
            auto_enable_ocr_workaround: false,
            only_include_translated_page: false,
            max_pages_per_part: None,
            formular_font_pattern: None,
            formular_char_pattern: None,
            no_merge_alternating_line_numbers: false,
            no_remove_non_formula_lines: false,
            non_formula_line_iou_threshold: 0.9,
            figure_table_protection_threshold: 0.9,
            skip_formula_offset_calculation: false,
        }
    }
}

/// Caller-context switches. These govern what a browser client is allowed to
/// do and are never changed by a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiSettings {
    /// When set, credential fields from raw input are ignored.
    pub disable_gui_sensitive_input: bool,
    /// When set, `SaveMode::FollowGlobalSetting` does not persist.
    pub disable_config_auto_save: bool,
}

/// Process-wide default configuration that every job's build starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseSettings {
    pub translation: TranslationSettings,
    pub pdf: PdfSettings,
    pub gui: GuiSettings,
    pub report_interval_secs: f64,
    /// Translation engine selector flag -> enabled.
    pub selectors: BTreeMap<String, bool>,
    /// Term-extraction selector flag (`term_`-prefixed) -> enabled.
    pub term_selectors: BTreeMap<String, bool>,
    /// Per-engine detail fields, keyed by selector flag.
    pub details: BTreeMap<String, BTreeMap<String, FieldValue>>,
}

impl Default for BaseSettings {
    fn default() -> Self {
        BaseSettings {
            translation: TranslationSettings::default(),
            pdf: PdfSettings::default(),
            gui: GuiSettings::default(),
            report_interval_secs: REPORT_INTERVAL_SECS,
            selectors: BTreeMap::new(),
            term_selectors: BTreeMap::new(),
            details: BTreeMap::new(),
        }
    }
}

impl BaseSettings {
    /// Structural invariants: exactly one translation engine selected, at
    /// most one term-extraction engine, enabled selectors known to the
    /// catalog, rate limits in range. Persisted files can be hand-edited, so
    /// these are checked on data, not only at the merge step.
    pub fn validate(&self) -> Result<()> {
        let enabled: Vec<&str> = self
            .selectors
            .iter()
            .filter(|(_, on)| **on)
            .map(|(flag, _)| flag.as_str())
            .collect();
        if enabled.len() != 1 {
            return Err(Error::InvalidSettings(format!(
                "exactly one translation engine must be selected, found {}",
                enabled.len()
            )));
        }
        if !catalog::TRANSLATION_ENGINES
            .iter()
            .any(|m| m.selector == enabled[0])
        {
            return Err(Error::InvalidSettings(format!(
                "unknown translation engine selector: {}",
                enabled[0]
            )));
        }

        let term_enabled: Vec<&str> = self
            .term_selectors
            .iter()
            .filter(|(_, on)| **on)
            .map(|(flag, _)| flag.as_str())
            .collect();
        if term_enabled.len() > 1 {
            return Err(Error::InvalidSettings(format!(
                "at most one term extraction engine may be selected, found {}",
                term_enabled.len()
            )));
        }
        if let Some(flag) = term_enabled.first() {
            let known = catalog::term_extraction_engines()
                .any(|m| catalog::term_selector(m) == **flag);
            if !known {
                return Err(Error::InvalidSettings(format!(
                    "unknown term extraction engine selector: {flag}"
                )));
            }
        }

        for (label, qps) in [
            ("qps", self.translation.qps),
            ("term_qps", self.translation.term_qps),
        ] {
            if qps == Some(0) {
                return Err(Error::InvalidSettings(format!("{label} must be at least 1")));
            }
        }
        for (label, pool) in [
            ("pool_max_workers", self.translation.pool_max_workers),
            ("term_pool_max_workers", self.translation.term_pool_max_workers),
        ] {
            if let Some(pool) = pool {
                if pool < 1 || pool > POOL_WORKERS_MAX {
                    return Err(Error::InvalidSettings(format!(
                        "{label} must be between 1 and {POOL_WORKERS_MAX}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Fully resolved, validated configuration for exactly one job. Immutable
/// once handed to a backend adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub engine: String,
    pub backend: BackendKind,
    pub engine_details: BTreeMap<String, FieldValue>,
    pub term_engine: Option<String>,
    pub term_engine_details: BTreeMap<String, FieldValue>,
    pub translation: TranslationSettings,
    pub pdf: PdfSettings,
    pub report_interval_secs: f64,
}

/// Result of a build: the per-job snapshot plus, when the save mode calls
/// for it, the restored working copy to persist as the new default
/// configuration.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub config: ExecutionConfig,
    pub persist: Option<BaseSettings>,
}

/// Resolve a page selection from a named preset and an optional explicit
/// range string. "Range" with a blank range means no restriction, same as
/// "All"; an unknown preset is a hard failure rather than a silent fallback.
pub fn resolve_pages(preset: Option<&str>, explicit: Option<&str>) -> Result<Option<String>> {
    match preset.unwrap_or("All") {
        "All" => Ok(None),
        "First" => Ok(Some("1".to_string())),
        "First 5 pages" => Ok(Some("1,2,3,4,5".to_string())),
        "Range" => Ok(explicit.map(str::to_string)),
        other => Err(Error::InvalidSettings(format!(
            "Unknown page range preset: {other}"
        ))),
    }
}

/// Merge the base configuration with one job's raw inputs.
///
/// The base itself is never mutated; a clone does all the work. The returned
/// snapshot carries the job-specific input file, output directory and page
/// selection, while the persistence candidate has those restored to the
/// base's values. Validation failures surface as `InvalidSettings` before
/// any job is created.
pub fn build_execution_config(
    base: &BaseSettings,
    input_file: &Path,
    output_dir: &Path,
    save_mode: SaveMode,
    inputs: &RawInputs,
) -> Result<BuildOutcome> {
    let mut working = base.clone();

    // Job-transient fields, restored before the working copy may persist.
    let original_output = working.translation.output.clone();
    let original_pages = working.pdf.pages.clone();
    let original_gui = working.gui;

    let service = inputs
        .get("service")
        .ok_or_else(|| Error::InvalidSettings("no translation engine selected".into()))?;
    let engine = catalog::translation_engine(service).ok_or_else(|| {
        Error::InvalidSettings(format!("Unknown translation engine: {service}"))
    })?;

    working.translation.lang_in =
        language::source_code(inputs.get("lang_from").unwrap_or_default()).to_string();
    working.translation.lang_out =
        language::target_code(inputs.get("lang_to").unwrap_or_default()).to_string();

    working.pdf.pages = resolve_pages(inputs.get("page_range"), inputs.get("page_input"))?;
    working.translation.output = Some(output_dir.to_path_buf());
    working.report_interval_secs = REPORT_INTERVAL_SECS;

    if let Some(v) = require_bool(inputs, "ignore_cache")? {
        working.translation.ignore_cache = v;
    }
    if let Some(v) = require_i64(inputs, "min_text_length")? {
        working.translation.min_text_length = Some(v);
    }
    if let Some(v) = inputs.get("rpc_doclayout") {
        working.translation.rpc_doclayout = Some(v.to_string());
    }
    // The client switch is positive, the stored flag negative.
    if let Some(v) = require_bool(inputs, "enable_auto_term_extraction")? {
        working.translation.no_auto_extract_glossary = !v;
    }
    if let Some(v) = inputs.get("primary_font_family") {
        working.translation.primary_font_family = if v == "Auto" {
            None
        } else {
            Some(v.to_string())
        };
    }

    apply_rate_limits(&mut working, engine, inputs)?;
    let term_engine = apply_term_engine(&mut working, inputs, &original_gui)?;
    apply_pdf_overrides(&mut working.pdf, inputs)?;

    // Enable exactly the requested translation engine.
    for meta in catalog::TRANSLATION_ENGINES {
        working.selectors.insert(meta.selector.to_string(), false);
    }
    working.selectors.insert(engine.selector.to_string(), true);
    if !engine.fields.is_empty() {
        let details = working.details.entry(engine.selector.to_string()).or_default();
        copy_detail_fields(details, engine, inputs, &original_gui)?;
    }

    if let Some(prompt) = inputs.get("prompt") {
        working.translation.custom_prompt = Some(prompt.to_string());
    }
    working.translation.custom_system_prompt = inputs
        .get("custom_system_prompt_input")
        .map(str::to_string);
    working.translation.glossaries = inputs.get("glossaries").map(str::to_string);
    if let Some(v) = require_bool(inputs, "save_auto_extracted_glossary")? {
        working.translation.save_auto_extracted_glossary = v;
    }

    working.validate()?;

    let config = ExecutionConfig {
        input_file: input_file.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        engine: engine.name.to_string(),
        backend: engine.backend,
        engine_details: working
            .details
            .get(engine.selector)
            .cloned()
            .unwrap_or_default(),
        term_engine: term_engine.map(|m| m.name.to_string()),
        term_engine_details: term_engine
            .and_then(|m| working.details.get(&catalog::term_selector(m)).cloned())
            .unwrap_or_default(),
        translation: working.translation.clone(),
        pdf: working.pdf.clone(),
        report_interval_secs: working.report_interval_secs,
    };

    // Restore the transients; per-job glossaries never persist either.
    working.translation.output = original_output;
    working.pdf.pages = original_pages;
    working.gui = original_gui;
    working.translation.glossaries = None;

    let persist = match save_mode {
        SaveMode::Never => None,
        SaveMode::Always => Some(working),
        SaveMode::FollowGlobalSetting => {
            if working.gui.disable_config_auto_save {
                None
            } else {
                Some(working)
            }
        }
    };

    Ok(BuildOutcome { config, persist })
}

fn apply_rate_limits(
    working: &mut BaseSettings,
    engine: &EngineMetadata,
    inputs: &RawInputs,
) -> Result<()> {
    if !engine.rate_limit_exempt {
        match inputs.get("rate_limit_mode") {
            Some(label) => {
                let mode = RateLimitMode::from_label(label).ok_or_else(|| {
                    Error::InvalidSettings(format!("Unknown rate limit mode: {label}"))
                })?;
                let resolved = rate_limit::resolve(mode, inputs)?;
                working.translation.qps = Some(resolved.qps);
                working.translation.pool_max_workers = resolved.pool_workers;
            }
            None => {
                // No mode given: keep the configured rate, ensuring the
                // snapshot carries a concrete qps.
                working.translation.qps =
                    Some(working.translation.qps.unwrap_or(DEFAULT_QPS));
            }
        }
    }

    if let Some(label) = inputs.get("term_rate_limit_mode") {
        let mode = RateLimitMode::from_label(label).ok_or_else(|| {
            Error::InvalidSettings(format!("Unknown term rate limit mode: {label}"))
        })?;
        let resolved = rate_limit::resolve(mode, &inputs.strip_prefix("term_"))?;
        working.translation.term_qps = Some(resolved.qps);
        working.translation.term_pool_max_workers = resolved.pool_workers;
    }
    Ok(())
}

/// Reset every term selector, then enable and configure the requested one.
/// "Follow main translation engine" and a disabled auto-extraction both mean
/// no separate term engine.
fn apply_term_engine(
    working: &mut BaseSettings,
    inputs: &RawInputs,
    gui: &GuiSettings,
) -> Result<Option<&'static EngineMetadata>> {
    for meta in catalog::term_extraction_engines() {
        working.term_selectors.insert(catalog::term_selector(meta), false);
    }

    let Some(term_service) = inputs.get("term_service") else {
        return Ok(None);
    };
    if term_service == catalog::FOLLOW_MAIN_ENGINE
        || working.translation.no_auto_extract_glossary
    {
        return Ok(None);
    }

    let meta = catalog::term_extraction_engine(term_service).ok_or_else(|| {
        Error::InvalidSettings(format!("Unknown term extraction engine: {term_service}"))
    })?;
    working.term_selectors.insert(catalog::term_selector(meta), true);
    if !meta.fields.is_empty() {
        // Term detail fields are read by their plain names; schemas do not
        // overlap across engines, so sharing the flat input map is safe.
        let details = working.details.entry(catalog::term_selector(meta)).or_default();
        copy_detail_fields(details, meta, inputs, gui)?;
    }
    Ok(Some(meta))
}

/// Copy declared detail fields from raw input, coercing each to its declared
/// kind. Undeclared input keys are ignored; sensitive fields are skipped
/// entirely when the caller context disallows them.
fn copy_detail_fields(
    details: &mut BTreeMap<String, FieldValue>,
    engine: &EngineMetadata,
    inputs: &RawInputs,
    gui: &GuiSettings,
) -> Result<()> {
    for field in engine.fields {
        if gui.disable_gui_sensitive_input && field.sensitive {
            continue;
        }
        let Some(raw) = inputs.get(field.name) else {
            continue;
        };
        let value = match field.kind {
            FieldKind::String => FieldValue::Str(raw.to_string()),
            FieldKind::Integer => FieldValue::Int(raw.parse::<i64>().map_err(|_| {
                Error::InvalidSettings(format!("field '{}' must be an integer", field.name))
            })?),
            FieldKind::Boolean => {
                FieldValue::Bool(parse_bool_token(raw).ok_or_else(|| {
                    Error::InvalidSettings(format!("field '{}' must be a boolean", field.name))
                })?)
            }
        };
        details.insert(field.name.to_string(), value);
    }
    Ok(())
}

fn apply_pdf_overrides(pdf: &mut PdfSettings, inputs: &RawInputs) -> Result<()> {
    if let Some(v) = require_bool(inputs, "no_mono")? {
        pdf.no_mono = v;
    }
    if let Some(v) = require_bool(inputs, "no_dual")? {
        pdf.no_dual = v;
    }
    if let Some(v) = require_bool(inputs, "dual_translate_first")? {
        pdf.dual_translate_first = v;
    }
    if let Some(v) = require_bool(inputs, "use_alternating_pages_dual")? {
        pdf.use_alternating_pages_dual = v;
    }
    if let Some(label) = inputs.get("watermark_output_mode") {
        pdf.watermark_output_mode = WatermarkMode::from_label(label).ok_or_else(|| {
            Error::InvalidSettings(format!("Unknown watermark mode: {label}"))
        })?;
    }
    if let Some(v) = require_bool(inputs, "skip_clean")? {
        pdf.skip_clean = v;
    }
    if let Some(v) = require_bool(inputs, "disable_rich_text_translate")? {
        pdf.disable_rich_text_translate = v;
    }
    if let Some(v) = require_bool(inputs, "enhance_compatibility")? {
        pdf.enhance_compatibility = v;
    }
    if let Some(v) = require_bool(inputs, "split_short_lines")? {
        pdf.split_short_lines = v;
    }
    if let Some(v) = require_f64(inputs, "short_line_split_factor")? {
        pdf.short_line_split_factor = v;
    }
    if let Some(v) = require_bool(inputs, "translate_table_text")? {
        pdf.translate_table_text = v;
    }
    if let Some(v) = require_bool(inputs, "skip_scanned_detection")? {
        pdf.skip_scanned_detection = v;
    }
    if let Some(v) = require_bool(inputs, "ocr_workaround")? {
        pdf.ocr_workaround = v;
    }
    if let Some(v) = require_bool(inputs, "auto_enable_ocr_workaround")? {
        pdf.auto_enable_ocr_workaround = v;
    }
    if let Some(v) = require_bool(inputs, "only_include_translated_page")? {
        pdf.only_include_translated_page = v;
    }
    if let Some(v) = require_i64(inputs, "max_pages_per_part")? {
        if v > 0 {
            pdf.max_pages_per_part = Some(v as u32);
        }
    }
    if let Some(v) = inputs.get("formular_font_pattern") {
        pdf.formular_font_pattern = Some(v.to_string());
    }
    if let Some(v) = inputs.get("formular_char_pattern") {
        pdf.formular_char_pattern = Some(v.to_string());
    }
    // Positive client switches for negative stored flags.
    if let Some(v) = require_bool(inputs, "merge_alternating_line_numbers")? {
        pdf.no_merge_alternating_line_numbers = !v;
    }
    if let Some(v) = require_bool(inputs, "remove_non_formula_lines")? {
        pdf.no_remove_non_formula_lines = !v;
    }
    if let Some(v) = require_f64(inputs, "non_formula_line_iou_threshold")? {
        pdf.non_formula_line_iou_threshold = v;
    }
    if let Some(v) = require_f64(inputs, "figure_table_protection_threshold")? {
        pdf.figure_table_protection_threshold = v;
    }
    if let Some(v) = require_bool(inputs, "skip_formula_offset_calculation")? {
        pdf.skip_formula_offset_calculation = v;
    }
    Ok(())
}

fn require_bool(inputs: &RawInputs, key: &str) -> Result<Option<bool>> {
    match inputs.get_bool(key) {
        None => Ok(None),
        Some(Some(v)) => Ok(Some(v)),
        Some(None) => Err(Error::InvalidSettings(format!(
            "field '{key}' must be a boolean"
        ))),
    }
}

fn require_i64(inputs: &RawInputs, key: &str) -> Result<Option<i64>> {
    match inputs.get_i64(key) {
        None => Ok(None),
        Some(Some(v)) => Ok(Some(v)),
        Some(None) => Err(Error::InvalidSettings(format!(
            "field '{key}' must be an integer"
        ))),
    }
}

fn require_f64(inputs: &RawInputs, key: &str) -> Result<Option<f64>> {
    match inputs.get_f64(key) {
        None => Ok(None),
        Some(Some(v)) => Ok(Some(v)),
        Some(None) => Err(Error::InvalidSettings(format!(
            "field '{key}' must be a number"
        ))),
    }
}
