//! Block trees → compiled scripts.
//!
//! Pure and deterministic: the same stacks always produce equal output.
//! Nothing here fails; editor defects degrade to defaults or omissions.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::input::queue::key_label;
use crate::program::block::{BlockDefinition, BlockKind};
use crate::program::catalog::BlockCatalog;
use crate::program::command::{empty_list, Command, CommandList, CompiledCommand, CompiledScript, Trigger};
use crate::program::model::{BlockInstance, ScriptStack};
use crate::program::value::{ParamMap, ParamValue};

/// Compile every stack that starts with a hat.
pub fn compile(catalog: &BlockCatalog, stacks: &[ScriptStack]) -> Vec<CompiledScript> {
    stacks
        .iter()
        .filter_map(|stack| compile_stack(catalog, stack))
        .collect()
}

/// Compile one stack. None when it is empty or does not start with a hat.
pub fn compile_stack(catalog: &BlockCatalog, stack: &ScriptStack) -> Option<CompiledScript> {
    let (head, body) = stack.blocks.split_first()?;
    let Some(def) = catalog.get(&head.block_id) else {
        log::warn!("stack {}: unknown hat block '{}'", stack.id, head.block_id);
        return None;
    };
    if !def.is_hat() {
        log::debug!("stack {} starts with '{}', not a hat; skipped", stack.id, def.id);
        return None;
    }
    let trigger_values = validate(def, &head.values);
    let trigger = Trigger::from_hat(def.opcode, &trigger_values)?;
    Some(CompiledScript {
        trigger,
        trigger_values,
        commands: lower_sequence(catalog, body),
    })
}

fn lower_sequence(catalog: &BlockCatalog, blocks: &[BlockInstance]) -> CommandList {
    blocks
        .iter()
        .filter_map(|block| lower_block(catalog, block))
        .collect::<Vec<_>>()
        .into()
}

fn lower_block(catalog: &BlockCatalog, block: &BlockInstance) -> Option<CompiledCommand> {
    let Some(def) = catalog.get(&block.block_id) else {
        log::warn!("instance {}: unknown block '{}' skipped", block.instance_id, block.block_id);
        return None;
    };
    match def.kind {
        BlockKind::Hat => {
            log::debug!("instance {}: hat '{}' inside a stack skipped", block.instance_id, def.id);
            return None;
        }
        BlockKind::Reporter => return None,
        BlockKind::Command | BlockKind::ContainerCommand => {}
    }

    let values = validate(def, &block.values);
    let Some(op) = Command::lower(def.opcode, &values) else {
        log::warn!("block '{}' has no command for opcode '{}'", def.id, def.opcode);
        return None;
    };
    let (children, else_children) = if def.kind == BlockKind::ContainerCommand {
        (
            lower_sequence(catalog, &block.children),
            lower_sequence(catalog, &block.else_children),
        )
    } else {
        (empty_list(), empty_list())
    };

    Some(CompiledCommand {
        code: def.opcode,
        values,
        block_type: def.kind,
        op,
        children,
        else_children,
    })
}

/// Coerce raw editor values through the schema. Every schema key is
/// present in the result; keys outside the schema are dropped.
fn validate(def: &BlockDefinition, raw: &BTreeMap<String, Value>) -> ParamMap {
    def.params
        .iter()
        .map(|param| {
            let value = match param.coerce(raw.get(param.name)) {
                ParamValue::Text(key) if param.name == "key" => ParamValue::Text(key_label(&key)),
                other => other,
            };
            (param.name.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::block::{Category, ParamSpec};
    use crate::program::command::Condition;
    use serde_json::json;

    fn block(id: u64, block_id: &str) -> BlockInstance {
        BlockInstance::new(id, block_id)
    }

    fn sample_stack() -> ScriptStack {
        ScriptStack::new(
            1,
            vec![
                block(1, "onKey").with_value("key", "W"),
                block(2, "repeat").with_value("times", "3").with_children(vec![
                    block(3, "move").with_value("x", 1),
                    block(4, "changeVar").with_value("var", "score"),
                ]),
                block(5, "setColor").with_value("color", "#00ff00"),
            ],
        )
    }

    #[test]
    fn compiling_twice_is_identical() {
        let catalog = BlockCatalog::builtin();
        let stacks = vec![sample_stack()];
        let a = compile(&catalog, &stacks);
        let b = compile(&catalog, &stacks);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[test]
    fn stack_without_hat_is_dropped() {
        let catalog = BlockCatalog::builtin();
        let stacks = vec![
            ScriptStack::new(1, vec![block(1, "move"), block(2, "hide")]),
            ScriptStack::new(2, Vec::new()),
            sample_stack(),
        ];
        let compiled = compile(&catalog, &stacks);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].trigger, Trigger::Key("w".into()));
    }

    #[test]
    fn defaults_fill_missing_and_bad_values() {
        let catalog = BlockCatalog::builtin();
        let stack = ScriptStack::new(
            1,
            vec![
                block(1, "onStart"),
                block(2, "move").with_value("x", "fast").with_value("y", "2"),
            ],
        );
        let script = compile_stack(&catalog, &stack).unwrap();
        assert_eq!(script.commands[0].op, Command::Move(glam::Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(script.commands[0].values["z"], ParamValue::Number(0.0));
    }

    #[test]
    fn unknown_blocks_are_omitted_without_touching_siblings() {
        let catalog = BlockCatalog::builtin();
        let stack = ScriptStack::new(
            1,
            vec![
                block(1, "onStart"),
                block(2, "forever").with_children(vec![
                    block(3, "teleportCat"),
                    block(4, "hide"),
                ]),
                block(5, "nope"),
                block(6, "show"),
            ],
        );
        let script = compile_stack(&catalog, &stack).unwrap();
        assert_eq!(script.commands.len(), 2);
        assert_eq!(script.commands[0].children.len(), 1);
        assert_eq!(script.commands[0].children[0].op, Command::Hide);
        assert_eq!(script.commands[1].op, Command::Show);
    }

    #[test]
    fn inner_hats_and_reporters_are_omitted() {
        let catalog = BlockCatalog::builtin();
        let stack = ScriptStack::new(
            1,
            vec![block(1, "onClick"), block(2, "onStart"), block(3, "varValue"), block(4, "hide")],
        );
        let script = compile_stack(&catalog, &stack).unwrap();
        assert_eq!(script.commands.len(), 1);
    }

    #[test]
    fn if_else_keeps_both_branches() {
        let catalog = BlockCatalog::builtin();
        let stack = ScriptStack::new(
            1,
            vec![
                block(1, "onStart"),
                block(2, "ifElse")
                    .with_value("condition", "anyKey")
                    .with_children(vec![block(3, "show")])
                    .with_else(vec![block(4, "hide"), block(5, "stop")]),
            ],
        );
        let script = compile_stack(&catalog, &stack).unwrap();
        let cmd = &script.commands[0];
        assert_eq!(cmd.op, Command::IfElse(Condition::AnyKey));
        assert_eq!(cmd.children.len(), 1);
        assert_eq!(cmd.else_children.len(), 2);
    }

    #[test]
    fn every_comparison_symbol_survives_compilation() {
        use crate::program::command::Comparison;
        let catalog = BlockCatalog::builtin();
        let cases = [
            ("=", Comparison::Eq),
            ("==", Comparison::Eq),
            ("≠", Comparison::Ne),
            ("!=", Comparison::Ne),
            ("<", Comparison::Lt),
            (">", Comparison::Gt),
            ("≤", Comparison::Le),
            ("<=", Comparison::Le),
            ("≥", Comparison::Ge),
            (">=", Comparison::Ge),
        ];
        for (symbol, expected) in cases {
            let stack = ScriptStack::new(
                1,
                vec![
                    block(1, "onStart"),
                    block(2, "if")
                        .with_value("condition", "variable")
                        .with_value("var", "score")
                        .with_value("op", symbol)
                        .with_value("value", 5),
                ],
            );
            let script = compile_stack(&catalog, &stack).unwrap();
            assert_eq!(
                script.commands[0].op,
                Command::If(Condition::Variable { name: "score".into(), op: expected, value: 5.0 }),
                "op {symbol}"
            );
        }
    }

    #[test]
    fn leaf_blocks_ignore_stray_children() {
        let catalog = BlockCatalog::builtin();
        let stack = ScriptStack::new(
            1,
            vec![block(1, "onStart"), block(2, "hide").with_children(vec![block(3, "show")])],
        );
        let script = compile_stack(&catalog, &stack).unwrap();
        assert!(script.commands[0].children.is_empty());
    }

    #[test]
    fn compiled_form_serializes_editor_shape() {
        let catalog = BlockCatalog::builtin();
        let script = compile_stack(&catalog, &sample_stack()).unwrap();
        let json = serde_json::to_value(&script).unwrap();
        assert_eq!(json["trigger"], json!("onKey"));
        assert_eq!(json["triggerValues"]["key"], json!("w"));
        assert_eq!(json["commands"][0]["code"], json!("repeat"));
        assert_eq!(json["commands"][0]["type"], json!("containerCommand"));
        assert_eq!(json["commands"][0]["values"]["times"], json!(3.0));
        assert_eq!(json["commands"][0]["children"][0]["code"], json!("move"));
        assert_eq!(json["commands"][1]["values"]["color"], json!("#00ff00"));
        assert!(json["commands"][1].get("children").is_none());
    }

    #[test]
    fn custom_catalogs_compile_with_their_own_defaults() {
        static DEFS: &[BlockDefinition] = &[
            BlockDefinition {
                id: "go",
                category: Category::Events,
                kind: BlockKind::Hat,
                params: &[],
                opcode: "onStart",
            },
            BlockDefinition {
                id: "waitLong",
                category: Category::Control,
                kind: BlockKind::Command,
                params: &[ParamSpec::number("seconds", 9.0)],
                opcode: "wait",
            },
        ];
        let catalog = BlockCatalog::new(DEFS.iter().copied());
        let stack = ScriptStack::new(1, vec![block(1, "go"), block(2, "waitLong")]);
        let script = compile_stack(&catalog, &stack).unwrap();
        assert_eq!(script.trigger, Trigger::Start);
        assert_eq!(script.commands[0].op, Command::Wait(9.0));
    }
}
