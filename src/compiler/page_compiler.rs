use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use std::time::SystemTime;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use super::ControlTemplate;
use super::SourceLocation;
use super::TemplateParser;
use crate::CompareOperator;
use crate::CompareTarget;
use crate::CompileError;
use crate::CompilerConfig;
use crate::Control;
use crate::ControlId;
use crate::ControlKind;
use crate::FileProvider;
use crate::Page;
use crate::Result;
use crate::ValidationConfig;
use crate::ValidatorRule;
use crate::ValidatorState;

/// Compiles a template path into an immutable shared artifact.
///
/// The token is a cooperative abort: a cancelled compile yields
/// `CompileError::Cancelled` and never a partial artifact.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageCompiler: Send + Sync + 'static {
    async fn compile_page(
        &self,
        files: Arc<dyn FileProvider>,
        path: &str,
        token: CancellationToken,
    ) -> Result<Arc<CompiledPage>>;
}

/// Immutable compiled template. Shared across requests; every request
/// instantiates its own control tree from it.
#[derive(Debug)]
pub struct CompiledPage {
    path: String,
    title: String,
    fingerprint: Option<SystemTime>,
    roots: Vec<CompiledControl>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledControl {
    id: String,
    kind: CompiledKind,
    text: Option<String>,
    visible: bool,
    enabled: bool,
    children: Vec<CompiledControl>,
}

#[derive(Debug, Clone)]
enum CompiledKind {
    Form,
    TextBox,
    Label,
    Button,
    Panel,
    Literal(String),
    Validator(CompiledValidator),
}

#[derive(Debug, Clone)]
struct CompiledValidator {
    rule: ValidatorRule,
    control_to_validate: String,
    error_message: String,
    validation_group: String,
    display: Option<String>,
    client_echo: bool,
}

impl CompiledPage {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fingerprint(&self) -> Option<SystemTime> {
        self.fingerprint
    }

    /// Builds a fresh request-scoped control tree. Values set here are
    /// template defaults, applied before tracking starts so they stay
    /// out of the persisted delta.
    pub fn instantiate(
        &self,
        validation: &ValidationConfig,
    ) -> Result<Page> {
        let mut page = Page::new(validation.clone());
        let root = page.root();
        let mut literal_seq = 0usize;
        for control in &self.roots {
            Self::instantiate_control(&mut page, root, control, &mut literal_seq)?;
        }
        Ok(page)
    }

    fn instantiate_control(
        page: &mut Page,
        parent: ControlId,
        compiled: &CompiledControl,
        literal_seq: &mut usize,
    ) -> Result<()> {
        let mut control = match &compiled.kind {
            CompiledKind::Form => Control::new(&compiled.id, ControlKind::Form),
            CompiledKind::TextBox => Control::new(&compiled.id, ControlKind::TextBox),
            CompiledKind::Label => Control::new(&compiled.id, ControlKind::Label),
            CompiledKind::Button => Control::new(&compiled.id, ControlKind::Button),
            CompiledKind::Panel => {
                let mut c = Control::new(&compiled.id, ControlKind::Custom("panel".to_string()));
                c.set_naming_container(true);
                c
            }
            CompiledKind::Literal(text) => {
                *literal_seq += 1;
                Control::new(
                    format!("__literal{literal_seq}"),
                    ControlKind::Literal(text.clone()),
                )
            }
            CompiledKind::Validator(v) => {
                let mut state = ValidatorState::new(v.rule.clone());
                state.client_echo = v.client_echo;
                let mut c = Control::new(&compiled.id, ControlKind::Validator(state));
                c.set_control_to_validate(&v.control_to_validate);
                c.set_error_message(&v.error_message);
                if !v.validation_group.is_empty() {
                    c.set_validation_group(&v.validation_group);
                }
                if let Some(display) = &v.display {
                    c.state_mut().set("Display", display.as_str());
                }
                c
            }
        };

        if let Some(text) = &compiled.text {
            control.set_text(text.clone());
        }
        control.set_visible(compiled.visible);
        control.set_enabled(compiled.enabled);

        let id = page.add_control(parent, control)?;
        for child in &compiled.children {
            Self::instantiate_control(page, id, child, literal_seq)?;
        }
        Ok(())
    }
}

/// Parses template source and lowers it into a `CompiledPage`, resolving
/// validator operands (numeric bounds, pattern expressions) at compile
/// time so instantiation never fails on them.
pub struct DynamicPageCompiler {
    config: CompilerConfig,
}

impl DynamicPageCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageCompiler for DynamicPageCompiler {
    async fn compile_page(
        &self,
        files: Arc<dyn FileProvider>,
        path: &str,
        token: CancellationToken,
    ) -> Result<Arc<CompiledPage>> {
        let started = Instant::now();
        let source_path = PathBuf::from(path);
        if token.is_cancelled() {
            return Err(CompileError::Cancelled { path: source_path }.into());
        }

        let info = files.get_file_info(path).await?;
        if !info.exists {
            return Err(CompileError::NotFound { path: source_path }.into());
        }
        if info.length > self.config.max_template_bytes as u64 {
            return Err(CompileError::Reference {
                path: source_path,
                message: format!(
                    "template is {} bytes, limit is {}",
                    info.length, self.config.max_template_bytes
                ),
            }
            .into());
        }

        let bytes = files.open_read(path).await?;
        if token.is_cancelled() {
            return Err(CompileError::Cancelled { path: source_path }.into());
        }
        let source = String::from_utf8(bytes).map_err(|e| CompileError::Reference {
            path: source_path.clone(),
            message: format!("template is not valid UTF-8: {e}"),
        })?;

        let parsed =
            TemplateParser::new(&source, &source_path, self.config.strict_directives).parse()?;
        if token.is_cancelled() {
            return Err(CompileError::Cancelled { path: source_path }.into());
        }

        let lowering = Lowering {
            path: &source_path,
            strict: self.config.strict_directives,
        };
        let mut roots = Vec::with_capacity(parsed.roots.len());
        for template in &parsed.roots {
            roots.push(lowering.lower(template)?);
        }

        info!(
            "compiled {} in {:?} ({} root controls)",
            path,
            started.elapsed(),
            roots.len()
        );
        Ok(Arc::new(CompiledPage {
            path: path.to_string(),
            title: parsed.title,
            fingerprint: info.last_modified,
            roots,
        }))
    }
}

/// Template-to-artifact lowering with per-element diagnostics.
struct Lowering<'a> {
    path: &'a Path,
    strict: bool,
}

impl Lowering<'_> {
    fn lower(
        &self,
        template: &ControlTemplate,
    ) -> Result<CompiledControl> {
        if template.is_literal() {
            return Ok(CompiledControl {
                id: String::new(),
                kind: CompiledKind::Literal(template.text.clone().unwrap_or_default()),
                text: None,
                visible: true,
                enabled: true,
                children: Vec::new(),
            });
        }

        let at = template.location;
        let kind = match template.tag.as_str() {
            "form" => CompiledKind::Form,
            "textbox" => CompiledKind::TextBox,
            "label" => CompiledKind::Label,
            "button" => CompiledKind::Button,
            "panel" => CompiledKind::Panel,
            "requiredvalidator" => CompiledKind::Validator(self.lower_validator(
                template,
                ValidatorRule::Required {
                    initial_value: template.attribute("initialvalue").unwrap_or_default().to_string(),
                },
            )?),
            "rangevalidator" => {
                let min = self.numeric_attribute(template, "minimumvalue", at)?;
                let max = self.numeric_attribute(template, "maximumvalue", at)?;
                if min > max {
                    return Err(CompileError::Reference {
                        path: self.path.to_path_buf(),
                        message: format!(
                            "range validator '{}' has minimumvalue {} above maximumvalue {}",
                            template.attribute("id").unwrap_or_default(),
                            min,
                            max
                        ),
                    }
                    .into());
                }
                CompiledKind::Validator(
                    self.lower_validator(template, ValidatorRule::Range { min, max })?,
                )
            }
            "comparevalidator" => {
                let against = match (
                    template.attribute("controltocompare"),
                    template.attribute("valuetocompare"),
                ) {
                    (Some(control), _) if !control.is_empty() => {
                        CompareTarget::Control(control.to_string())
                    }
                    (_, Some(value)) => CompareTarget::Value(value.to_string()),
                    _ => {
                        return Err(self
                            .syntax(at, "compare validator needs controltocompare or valuetocompare")
                            .into())
                    }
                };
                let operator = match template.attribute("operator") {
                    Some(raw) => CompareOperator::parse(raw).ok_or_else(|| {
                        self.syntax(at, format!("unknown compare operator '{raw}'"))
                    })?,
                    None => CompareOperator::Equal,
                };
                CompiledKind::Validator(
                    self.lower_validator(template, ValidatorRule::Compare { against, operator })?,
                )
            }
            "patternvalidator" => {
                let raw = template.attribute("validationexpression").ok_or_else(|| {
                    self.syntax(at, "pattern validator needs validationexpression")
                })?;
                let expr = Regex::new(raw).map_err(|e| CompileError::Reference {
                    path: self.path.to_path_buf(),
                    message: format!("invalid validation expression '{raw}': {e}"),
                })?;
                CompiledKind::Validator(
                    self.lower_validator(template, ValidatorRule::Pattern { expr })?,
                )
            }
            "customvalidator" => {
                let callback = template.attribute("callback").ok_or_else(|| {
                    self.syntax(at, "custom validator needs a callback name")
                })?;
                CompiledKind::Validator(self.lower_validator(
                    template,
                    ValidatorRule::Custom {
                        callback: callback.to_string(),
                    },
                )?)
            }
            other => return Err(self.syntax(at, format!("unknown tag <{other}>")).into()),
        };

        let id = match template.attribute("id") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(self.syntax(at, format!("<{}> needs an id", template.tag)).into()),
        };
        self.check_attributes(template)?;

        let mut children = Vec::with_capacity(template.children.len());
        for child in &template.children {
            children.push(self.lower(child)?);
        }

        Ok(CompiledControl {
            id,
            kind,
            text: template.attribute("text").map(str::to_string),
            visible: template.attribute("visible").map_or(true, |v| v != "false"),
            enabled: template.attribute("enabled").map_or(true, |v| v != "false"),
            children,
        })
    }

    fn lower_validator(
        &self,
        template: &ControlTemplate,
        rule: ValidatorRule,
    ) -> Result<CompiledValidator> {
        Ok(CompiledValidator {
            rule,
            control_to_validate: template
                .attribute("controltovalidate")
                .unwrap_or_default()
                .to_string(),
            error_message: template.attribute("errormessage").unwrap_or_default().to_string(),
            validation_group: template
                .attribute("validationgroup")
                .unwrap_or_default()
                .to_string(),
            display: template.attribute("display").map(str::to_string),
            client_echo: template
                .attribute("enableclientscript")
                .map_or(true, |v| v != "false"),
        })
    }

    fn numeric_attribute(
        &self,
        template: &ControlTemplate,
        name: &str,
        at: SourceLocation,
    ) -> Result<f64> {
        let raw = template
            .attribute(name)
            .ok_or_else(|| self.syntax(at, format!("<{}> needs '{name}'", template.tag)))?;
        raw.trim()
            .parse::<f64>()
            .map_err(|_| self.syntax(at, format!("'{name}' value '{raw}' is not numeric")).into())
    }

    fn check_attributes(
        &self,
        template: &ControlTemplate,
    ) -> Result<()> {
        for (name, _) in &template.attributes {
            if !known_attribute(&template.tag, name) {
                if self.strict {
                    return Err(self
                        .syntax(
                            template.location,
                            format!("unknown attribute '{name}' on <{}>", template.tag),
                        )
                        .into());
                }
                warn!(
                    "ignoring unknown attribute '{}' on <{}> in {:?}",
                    name, template.tag, self.path
                );
            }
        }
        Ok(())
    }

    fn syntax(
        &self,
        at: SourceLocation,
        message: impl Into<String>,
    ) -> CompileError {
        CompileError::Syntax {
            path: self.path.to_path_buf(),
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }
}

fn known_attribute(
    tag: &str,
    name: &str,
) -> bool {
    if matches!(name, "id" | "visible" | "enabled") {
        return true;
    }
    match tag {
        "textbox" | "label" | "button" => name == "text",
        "form" | "panel" => false,
        _ => {
            // validator tags
            matches!(
                name,
                "controltovalidate"
                    | "errormessage"
                    | "validationgroup"
                    | "display"
                    | "enableclientscript"
                    | "text"
            ) || matches!(
                (tag, name),
                ("requiredvalidator", "initialvalue")
                    | ("rangevalidator", "minimumvalue")
                    | ("rangevalidator", "maximumvalue")
                    | ("comparevalidator", "valuetocompare")
                    | ("comparevalidator", "controltocompare")
                    | ("comparevalidator", "operator")
                    | ("patternvalidator", "validationexpression")
                    | ("customvalidator", "callback")
            )
        }
    }
}
