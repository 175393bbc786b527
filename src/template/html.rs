//! Static HTML engine

use super::{CompileDiagnostic, TemplateEngine, js_string};

/// Static markup; the render function ignores its data
pub struct HtmlEngine;

impl TemplateEngine for HtmlEngine {
    fn type_tag(&self) -> &str {
        "html"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn compile(&self, source: &str) -> Result<String, CompileDiagnostic> {
        Ok(format!(
            "{{compiler:[{},{}],useData:false,main:function(){{return {}}}}}",
            js_string(self.type_tag()),
            js_string(self.version()),
            js_string(source)
        ))
    }
}
