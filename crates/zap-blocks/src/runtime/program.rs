use std::rc::Rc;

use crate::api::types::ObjectId;
use crate::core::scene::Scene;
use crate::program::catalog::BlockCatalog;
use crate::program::command::{CompiledScript, Event, Trigger};
use crate::program::compile::compile;

/// One compiled script bound to the object that owns it.
#[derive(Debug, Clone)]
pub struct RunningScriptEntry {
    pub target: ObjectId,
    pub script: Rc<CompiledScript>,
}

/// Every script of a run, compiled once at start.
#[derive(Debug, Clone, Default)]
pub struct Program {
    entries: Vec<RunningScriptEntry>,
}

impl Program {
    pub fn build(scene: &Scene, catalog: &BlockCatalog) -> Self {
        let entries = scene
            .iter()
            .flat_map(|object| {
                compile(catalog, &object.scripts)
                    .into_iter()
                    .map(move |script| RunningScriptEntry {
                        target: object.id,
                        script: Rc::new(script),
                    })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[RunningScriptEntry] {
        &self.entries
    }

    /// Entries started by `event`, optionally restricted to one object.
    pub fn matching<'a>(
        &'a self,
        event: &'a Event,
        target: Option<ObjectId>,
    ) -> impl Iterator<Item = &'a RunningScriptEntry> + 'a {
        self.entries.iter().filter(move |entry| {
            target.map_or(true, |t| t == entry.target) && entry.script.trigger.matches(event)
        })
    }

    /// First `defineBlock{name}` script on `owner`.
    pub fn find_definition(&self, owner: ObjectId, name: &str) -> Option<&CompiledScript> {
        self.entries
            .iter()
            .filter(|entry| entry.target == owner)
            .map(|entry| entry.script.as_ref())
            .find(|script| matches!(&script.trigger, Trigger::Define(n) if n == name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::SceneObject;
    use crate::program::model::{BlockInstance, ScriptStack};

    fn hat(id: &str, key: &str, value: &str) -> ScriptStack {
        ScriptStack::new(1, vec![BlockInstance::new(1, id).with_value(key, value)])
    }

    #[test]
    fn builds_entries_per_object() {
        let mut scene = Scene::new();
        let a = scene.allocate_id();
        let b = scene.allocate_id();
        scene.spawn(SceneObject::new(a).with_scripts(vec![
            hat("onMessage", "msg", "go"),
            hat("defineBlock", "name", "hop"),
        ]));
        scene.spawn(SceneObject::new(b).with_scripts(vec![hat("onMessage", "msg", "go")]));

        let program = Program::build(&scene, &BlockCatalog::builtin());
        assert_eq!(program.len(), 3);

        let go = Event::Message("go".into());
        assert_eq!(program.matching(&go, None).count(), 2);
        assert_eq!(program.matching(&go, Some(b)).count(), 1);
        assert!(program.find_definition(a, "hop").is_some());
        assert!(program.find_definition(b, "hop").is_none());
    }
}
