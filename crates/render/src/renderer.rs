use crate::cache::{CacheKey, CacheLookup, CacheStore, CachedRender};
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::outcome::{CacheStatus, RenderOutcome, RenderReport};
use crate::transform::SourceTransform;
use crate::truncate::truncate_literals;
use lens_code_printer::{CodePrinter, Language, SyntaxParser};
use lens_source_map::compose;
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Turns minified sources into readable text plus a position map back to the
/// file, reusing cached renders keyed by path and modification time.
pub struct Renderer {
    config: RenderConfig,
    printer: CodePrinter,
    cache: Option<Arc<dyn CacheStore>>,
}

impl Renderer {
    pub fn new(config: RenderConfig, cache: Arc<dyn CacheStore>) -> Result<Self> {
        let mut renderer = Self::without_cache(config)?;
        renderer.cache = Some(cache);
        Ok(renderer)
    }

    /// A renderer that never consults or populates a cache
    pub fn without_cache(config: RenderConfig) -> Result<Self> {
        config.validate().map_err(RenderError::invalid_config)?;
        let printer = CodePrinter::new(config.printer.clone())?;
        Ok(Self {
            config,
            printer,
            cache: None,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the file at `path`.
    ///
    /// Unparseable or unsupported sources come back as
    /// [`RenderOutcome::Fallback`] carrying the file text unchanged. Cache
    /// write failures are recorded in [`RenderReport::warnings`].
    pub async fn render(&self, path: impl AsRef<Path>) -> Result<RenderReport> {
        let path = path.as_ref();
        let report = self.render_untruncated(path).await?;
        Ok(self.truncate_report(report, Language::from_path(path)))
    }

    /// Render in-memory text. The cache is not involved.
    pub fn render_source(&self, text: &str, language: Language, source_name: &str) -> RenderOutcome {
        let outcome = self.print(text, language, source_name);
        self.truncate_outcome(outcome, language)
    }

    /// Render `path`, then run `transforms` in order over the rendered text.
    ///
    /// Each stage's map is composed onto the accumulated one, so the final map
    /// resolves positions in the last stage's output straight to the file.
    /// Truncation runs once, after the last stage.
    pub async fn render_with_transforms(
        &self,
        path: impl AsRef<Path>,
        transforms: &[Box<dyn SourceTransform>],
    ) -> Result<RenderReport> {
        let path = path.as_ref();
        let language = Language::from_path(path);
        let RenderReport {
            outcome,
            cache,
            mut warnings,
        } = self.render_untruncated(path).await?;

        let (mut text, mut map) = match outcome {
            RenderOutcome::Rendered { text, map } => (text, map),
            fallback @ RenderOutcome::Fallback { .. } => {
                if !transforms.is_empty() {
                    warnings.push(format!(
                        "Skipped {} transform(s): render fell back",
                        transforms.len()
                    ));
                }
                return Ok(RenderReport {
                    outcome: fallback,
                    cache,
                    warnings,
                });
            }
        };

        let mut parser = SyntaxParser::new(language)?;
        for transform in transforms {
            let parsed = parser.parse(&text)?;
            let output = transform
                .apply(&text, &parsed)
                .map_err(|e| RenderError::transform(transform.name(), e))?;
            log::debug!(
                "Applied transform '{}' to {} ({} -> {} bytes)",
                transform.name(),
                path.display(),
                text.len(),
                output.text.len()
            );
            map = compose(&output.map, &map);
            text = output.text;
        }

        let report = RenderReport {
            outcome: RenderOutcome::Rendered { text, map },
            cache,
            warnings,
        };
        Ok(self.truncate_report(report, language))
    }

    async fn render_untruncated(&self, path: &Path) -> Result<RenderReport> {
        let path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| RenderError::from_io(path, e))?;
        let language = Language::from_path(&path);
        let source_name = path.to_string_lossy().into_owned();

        let (Some(cache), true) = (self.cache.as_ref(), language.supports_ast()) else {
            let outcome = self.render_file(&path, language, &source_name).await?;
            return Ok(RenderReport::new(outcome, CacheStatus::Bypassed));
        };

        let key = CacheKey::new(path.clone(), modified_ms(&path).await?);
        let status = match cache.get(&key).await {
            CacheLookup::Hit(CachedRender { text, map }) => {
                log::debug!("Render cache hit for {}", path.display());
                return Ok(RenderReport::new(
                    RenderOutcome::Rendered { text, map },
                    CacheStatus::Hit,
                ));
            }
            CacheLookup::Stale => CacheStatus::Stale,
            CacheLookup::Miss => CacheStatus::Miss,
        };
        log::debug!("Render cache {status:?} for {}", path.display());

        let outcome = self.render_file(&path, language, &source_name).await?;
        let mut report = RenderReport::new(outcome, status);

        if let RenderOutcome::Rendered { text, map } = &report.outcome {
            let entry = CachedRender {
                text: text.clone(),
                map: map.clone(),
            };
            if let Err(err) = cache.put(&key, &entry).await {
                log::warn!("Failed to cache render of {}: {err}", path.display());
                report.warnings.push(err.to_string());
            }
        }
        Ok(report)
    }

    /// Read and print the file. Bytes that are not UTF-8 fall back to a lossy
    /// copy of the source.
    async fn render_file(&self, path: &Path, language: Language, source_name: &str) -> Result<RenderOutcome> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RenderError::from_io(path, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(self.print(&text, language, source_name)),
            Err(err) => {
                let reason = format!("source is not valid UTF-8: {}", err.utf8_error());
                log::warn!("Rendering {source_name} fell back to source text: {reason}");
                Ok(RenderOutcome::Fallback {
                    text: String::from_utf8_lossy(err.as_bytes()).into_owned(),
                    reason,
                })
            }
        }
    }

    fn print(&self, text: &str, language: Language, source_name: &str) -> RenderOutcome {
        match self.printer.format(text, language, source_name) {
            Ok(printed) => RenderOutcome::Rendered {
                text: printed.text,
                map: printed.map,
            },
            Err(err) => {
                log::warn!("Rendering {source_name} fell back to source text: {err}");
                RenderOutcome::Fallback {
                    text: text.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn truncate_report(&self, mut report: RenderReport, language: Language) -> RenderReport {
        report.outcome = self.truncate_outcome(report.outcome, language);
        report
    }

    fn truncate_outcome(&self, outcome: RenderOutcome, language: Language) -> RenderOutcome {
        match (outcome, &self.config.truncate) {
            (RenderOutcome::Rendered { text, map }, Some(options)) => RenderOutcome::Rendered {
                text: truncate_literals(&text, language, options),
                map,
            },
            (outcome, _) => outcome,
        }
    }
}

async fn modified_ms(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| RenderError::from_io(path, e))?;
    let modified = metadata
        .modified()
        .map_err(|e| RenderError::from_io(path, e))?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0))
}
