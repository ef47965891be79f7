//! Picking the compiled member to open once the log has been ingested.

use crate::model::{AnalysisModel, MetaMember};
use crate::sink::SandboxSink;

/// Finds the first compiled member of the session's first unit.
pub struct ResultLocator<'a> {
    model: &'a dyn AnalysisModel,
    sink: &'a dyn SandboxSink,
}

impl<'a> ResultLocator<'a> {
    pub fn new(model: &'a dyn AnalysisModel, sink: &'a dyn SandboxSink) -> Self {
        Self { model, sink }
    }

    /// Look up `class_name` and hand its first compiled member to the sink.
    ///
    /// A missing class or a class with nothing compiled yields `None`; the
    /// sink is told to navigate either way.
    pub fn locate(&self, class_name: &str) -> Option<MetaMember> {
        self.sink.log(&format!("Looking up class: {class_name}"));

        let found = self.model.lookup(class_name).and_then(|class| {
            self.sink.log(&format!("Found: {}", class.fully_qualified_name));
            self.sink.log("Looking for compiled members");
            class.members().iter().find(|m| m.is_compiled()).cloned()
        });

        if found.is_none() {
            tracing::debug!("No compiled member for {}", class_name);
        }

        self.sink.navigate_to(found.as_ref());
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::model::MetaClass;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapModel {
        classes: HashMap<String, MetaClass>,
    }

    impl MapModel {
        fn with(mut self, class: MetaClass) -> Self {
            self.classes.insert(class.fully_qualified_name.clone(), class);
            self
        }
    }

    impl AnalysisModel for MapModel {
        fn reset(&mut self) {}

        fn ingest(&mut self, _log_file: &Path) -> Result<()> {
            Ok(())
        }

        fn lookup(&self, fqn: &str) -> Option<&MetaClass> {
            self.classes.get(fqn)
        }
    }

    #[derive(Default)]
    struct Navigations(Mutex<Vec<Option<String>>>);

    impl SandboxSink for Navigations {
        fn log(&self, _line: &str) {}

        fn show_error(&self, _text: &str) {}

        fn navigate_to(&self, member: Option<&MetaMember>) {
            self.0.lock().unwrap().push(member.map(|m| m.signature.clone()));
        }
    }

    #[test]
    fn test_first_compiled_member_wins() {
        let model = MapModel::default().with(MetaClass::new(
            "p.Main",
            vec![
                MetaMember::new("public p.Main()", false),
                MetaMember::new("private int add(int,int)", true),
                MetaMember::new("public void run()", true),
            ],
        ));
        let sink = Navigations::default();

        let found = ResultLocator::new(&model, &sink).locate("p.Main");
        assert_eq!(found.map(|m| m.signature), Some("private int add(int,int)".to_string()));
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![Some("private int add(int,int)".to_string())]
        );
    }

    #[test]
    fn test_nothing_compiled() {
        let model = MapModel::default().with(MetaClass::new(
            "Main",
            vec![MetaMember::new("public static void main(String[])", false)],
        ));
        let sink = Navigations::default();

        assert!(ResultLocator::new(&model, &sink).locate("Main").is_none());
        assert_eq!(*sink.0.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_unknown_class() {
        let model = MapModel::default();
        let sink = Navigations::default();

        assert!(ResultLocator::new(&model, &sink).locate("Ghost").is_none());
        assert_eq!(*sink.0.lock().unwrap(), vec![None]);
    }
}
