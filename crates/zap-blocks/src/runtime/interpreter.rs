//! One handler arm per [`Command`]. Commands on a missing owner do nothing.

use glam::Vec3;

use crate::api::types::{HostCommand, ObjectId};
use crate::core::object::SceneObject;
use crate::core::physics::PLAYER_HALF_EXTENTS;
use crate::program::command::{Command, CompiledCommand, Event};
use crate::runtime::condition::evaluate;
use crate::runtime::context::RunContext;
use crate::runtime::program::Program;
use crate::runtime::scheduler::{Flow, Frame, Wake};
use crate::systems::animation::Effect;

/// Health never heals past this.
pub const MAX_HEALTH: f64 = 100.0;
/// Speech overlays float this far above the object's top.
const SAY_OFFSET: f32 = 0.5;

/// Execute one command for the task owned by `owner`.
pub fn execute(cmd: &CompiledCommand, owner: ObjectId, ctx: &mut RunContext, program: &Program) -> Flow {
    match &cmd.op {
        // -- Motion --
        Command::Move(delta) => with_object(ctx, owner, |o| o.position += *delta),
        Command::SetPosition(p) => with_object(ctx, owner, |o| o.position = *p),
        Command::Rotate(delta) => with_object(ctx, owner, |o| o.rotation += *delta),
        Command::SetRotation(r) => with_object(ctx, owner, |o| o.rotation = *r),
        Command::Glide { target, seconds, relative } => {
            return glide(ctx, owner, *target, *seconds, *relative);
        }
        Command::LookAtPlayer => {
            let player = ctx.player.position;
            with_object(ctx, owner, |o| {
                let d = player - o.position;
                o.rotation.y = d.x.atan2(d.z);
            })
        }
        Command::TeleportPlayer(p) => {
            ctx.player.position = *p;
            ctx.player.velocity = Vec3::ZERO;
            ctx.player.move_target = None;
        }
        Command::SetSpawnPoint => {
            if let Some(object) = ctx.scene.get(owner) {
                let top = object.aabb().max.y;
                ctx.player.spawn_point = Vec3::new(
                    object.position.x,
                    top + PLAYER_HALF_EXTENTS.y,
                    object.position.z,
                );
            }
        }
        Command::LaunchPlayer(force) => {
            ctx.player.velocity.y = *force;
            ctx.player.grounded = false;
        }

        // -- Looks --
        Command::SetColor(c) => with_object(ctx, owner, |o| o.color = *c),
        Command::SetOpacity(a) => with_object(ctx, owner, |o| o.opacity = *a),
        Command::Show => with_object(ctx, owner, |o| o.visible = true),
        Command::Hide => with_object(ctx, owner, |o| o.visible = false),
        Command::SetScale(s) => with_object(ctx, owner, |o| o.scale = *s),
        Command::ChangeScale(factor) => with_object(ctx, owner, |o| o.scale *= *factor),
        Command::Say { text, seconds } => {
            if let Some(object) = ctx.scene.get(owner) {
                let above = object.position + Vec3::Y * (object.world_half_extents().y + SAY_OFFSET);
                ctx.emit(HostCommand::PositionOverlay {
                    object: owner,
                    text: text.clone(),
                    world: above.to_array(),
                    seconds: *seconds,
                });
            }
        }

        // -- Effects --
        Command::Spin { axis, speed } => add_effect(ctx, owner, |_| Effect::spin(*axis, *speed)),
        Command::Bounce { height, speed } => add_effect(ctx, owner, |o| Effect::bounce(o, *height, *speed)),
        Command::Patrol { axis, distance, speed } => {
            add_effect(ctx, owner, |o| Effect::patrol(o, *axis, *distance, *speed))
        }
        Command::FollowPlayer { speed } => add_effect(ctx, owner, |_| Effect::FollowPlayer { speed: *speed }),
        Command::ColorShift { speed } => add_effect(ctx, owner, |o| Effect::color_shift(o, *speed)),
        Command::Gravity => {
            if ctx.scene.get(owner).is_some_and(|o| !o.anchored) {
                ctx.animations.add(owner, Effect::Gravity { velocity: 0.0 });
            }
        }
        Command::Orbit { radius, speed } => add_effect(ctx, owner, |o| Effect::orbit(o, *radius, *speed)),
        Command::ScalePulse { min, max, speed } => {
            add_effect(ctx, owner, |o| Effect::scale_pulse(o, *min, *max, *speed))
        }
        Command::Particles { color, count } => {
            if let Some(object) = ctx.scene.get(owner) {
                let effect = Effect::particle_burst(object, *color, *count, &mut ctx.rng);
                ctx.animations.add(owner, effect);
            }
        }
        Command::Trail { color } => add_effect(ctx, owner, |_| Effect::trail(*color)),
        Command::StopParticles => ctx.animations.stop_particles(owner),
        Command::StopEffects => ctx.animations.remove_object(owner),

        // -- Control --
        Command::Wait(seconds) => return Flow::Suspend(Wake::At(ctx.now + seconds)),
        Command::WaitUntil(condition) => {
            if !evaluate(condition, owner, ctx) {
                return Flow::Suspend(Wake::Poll {
                    condition: condition.clone(),
                    next_check: ctx.now + ctx.config.poll_interval,
                });
            }
        }
        Command::Repeat(times) => {
            if *times > 0 && !cmd.children.is_empty() {
                return Flow::Enter(Frame::repeat(cmd.children.clone(), *times));
            }
        }
        Command::Forever => {
            if !cmd.children.is_empty() {
                return Flow::Spawn(Frame::forever(cmd.children.clone()));
            }
        }
        Command::If(condition) => {
            if evaluate(condition, owner, ctx) && !cmd.children.is_empty() {
                return Flow::Enter(Frame::sequence(cmd.children.clone()));
            }
        }
        Command::IfElse(condition) => {
            let branch = if evaluate(condition, owner, ctx) {
                &cmd.children
            } else {
                &cmd.else_children
            };
            if !branch.is_empty() {
                return Flow::Enter(Frame::sequence(branch.clone()));
            }
        }
        Command::While(condition) => {
            return Flow::Enter(Frame::while_loop(condition.clone(), cmd.children.clone()));
        }
        Command::ForEach { var, start, end } => {
            return Flow::Enter(Frame::for_each(var.clone(), *start, *end, cmd.children.clone()));
        }
        Command::Stop => return Flow::Stop,
        Command::Call(name) => match program.find_definition(owner, name) {
            Some(definition) => return Flow::Enter(Frame::sequence(definition.commands.clone())),
            None => log::debug!("callBlock '{}': no definition on {:?}", name, owner),
        },

        // -- Variables --
        Command::SetVar { name, value } => {
            ctx.set_var(name, *value);
        }
        Command::ChangeVar { name, amount } => {
            ctx.change_var(name, *amount);
        }
        Command::ResetVar(name) => {
            ctx.reset_var(name);
        }
        Command::ShowVar(name) => ctx.show_var(name),

        // -- Sound, events, UI --
        Command::PlaySound(name) => ctx.emit(HostCommand::PlaySound { name: name.clone() }),
        Command::PlayTone { frequency, seconds } => ctx.emit(HostCommand::PlayTone {
            frequency: *frequency,
            seconds: *seconds,
        }),
        Command::Broadcast(message) => ctx.raise(Event::Message(message.clone()), None),
        Command::ShowMessage { text, seconds } => ctx.emit(HostCommand::ShowMessage {
            text: text.clone(),
            seconds: *seconds,
        }),

        // -- Objects --
        Command::SpawnObject { shape, position } => {
            let id = ctx.scene.allocate_id();
            ctx.scene
                .spawn(SceneObject::new(id).with_shape(shape.clone()).with_position(*position));
            ctx.emit(HostCommand::ObjectSpawned { id });
        }
        Command::Duplicate => {
            if let Some(id) = ctx.scene.duplicate(owner) {
                ctx.emit(HostCommand::ObjectSpawned { id });
            }
        }
        Command::Destroy => {
            ctx.remove_object(owner);
            return Flow::Stop;
        }

        // -- Game --
        Command::Damage(amount) => {
            let before = ctx.variables.get("health");
            let after = ctx.change_var("health", -amount);
            if before > 0.0 && after <= 0.0 {
                ctx.raise(Event::HealthZero, None);
            }
        }
        Command::Heal(amount) => {
            let healed = (ctx.variables.get("health") + amount).min(MAX_HEALTH);
            ctx.set_var("health", healed);
        }
        Command::AddScore(amount) => {
            ctx.change_var("score", *amount);
        }
        Command::CollectItem => {
            ctx.change_var("coins", 1.0);
            with_object(ctx, owner, |o| o.visible = false);
            ctx.raise(Event::ItemCollected, None);
        }
        Command::DefeatEnemy => {
            with_object(ctx, owner, |o| o.visible = false);
            ctx.raise(Event::EnemyDefeated, None);
        }
        Command::LoseLife => {
            let before = ctx.variables.get("lives");
            let after = ctx.change_var("lives", -1.0);
            if before > 0.0 && after <= 0.0 {
                ctx.raise(Event::LivesZero, None);
            }
        }
        Command::StartTimer(seconds) => ctx.start_countdown(*seconds),
        Command::SetPlayerSpeed(speed) => ctx.player.speed = *speed,
        Command::SetJumpForce(force) => ctx.player.jump_force = *force,
    }
    Flow::Next
}

fn with_object(ctx: &mut RunContext, owner: ObjectId, f: impl FnOnce(&mut SceneObject)) {
    if let Some(object) = ctx.scene.get_mut(owner) {
        f(object);
    }
}

fn add_effect(ctx: &mut RunContext, owner: ObjectId, make: impl FnOnce(&SceneObject) -> Effect) {
    if let Some(object) = ctx.scene.get(owner) {
        let effect = make(object);
        ctx.animations.add(owner, effect);
    }
}

/// Start an eased move and suspend until its record finishes. Non-positive
/// durations jump straight to the end.
fn glide(ctx: &mut RunContext, owner: ObjectId, target: Vec3, seconds: f64, relative: bool) -> Flow {
    let Some(object) = ctx.scene.get_mut(owner) else {
        return Flow::Next;
    };
    let from = object.position;
    let to = if relative { from + target } else { target };
    if seconds <= 0.0 {
        object.position = to;
        return Flow::Next;
    }
    let record = ctx.animations.add(owner, Effect::glide(from, to, seconds as f32));
    Flow::Suspend(Wake::Animation(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::block::BlockKind;
    use crate::program::command::{empty_list, Condition};
    use crate::program::value::ParamMap;

    fn command(op: Command) -> CompiledCommand {
        CompiledCommand {
            code: "test",
            values: ParamMap::new(),
            block_type: BlockKind::Command,
            op,
            children: empty_list(),
            else_children: empty_list(),
        }
    }

    fn setup() -> (RunContext, ObjectId) {
        let mut ctx = RunContext::default();
        let id = ctx.scene.allocate_id();
        ctx.scene.spawn(SceneObject::new(id).with_position(Vec3::new(0.0, 1.0, 0.0)));
        ctx.running = true;
        (ctx, id)
    }

    fn run(op: Command, ctx: &mut RunContext, id: ObjectId) -> Flow {
        execute(&command(op), id, ctx, &Program::default())
    }

    #[test]
    fn motion_mutates_owner_only() {
        let (mut ctx, id) = setup();
        let other = ctx.scene.allocate_id();
        ctx.scene.spawn(SceneObject::new(other));
        run(Command::Move(Vec3::X), &mut ctx, id);
        assert_eq!(ctx.scene.get(id).unwrap().position, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(ctx.scene.get(other).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn glide_registers_record_and_suspends() {
        let (mut ctx, id) = setup();
        let flow = run(
            Command::Glide { target: Vec3::new(1.0, 0.0, 0.0), seconds: 0.5, relative: true },
            &mut ctx,
            id,
        );
        let Flow::Suspend(Wake::Animation(record)) = flow else {
            panic!("glide did not suspend on its record");
        };
        assert!(ctx.animations.contains(record));
        assert_eq!(ctx.animations.len(), 1);
    }

    #[test]
    fn zero_length_glide_is_instant() {
        let (mut ctx, id) = setup();
        let flow = run(
            Command::Glide { target: Vec3::new(4.0, 0.0, 0.0), seconds: 0.0, relative: false },
            &mut ctx,
            id,
        );
        assert!(matches!(flow, Flow::Next));
        assert_eq!(ctx.scene.get(id).unwrap().position, Vec3::new(4.0, 0.0, 0.0));
        assert!(ctx.animations.is_empty());
    }

    #[test]
    fn damage_raises_health_zero_on_crossing_only() {
        let (mut ctx, id) = setup();
        run(Command::Damage(60.0), &mut ctx, id);
        assert!(ctx.pop_event().is_none());
        run(Command::Damage(60.0), &mut ctx, id);
        assert_eq!(ctx.pop_event().map(|q| q.event), Some(Event::HealthZero));
        run(Command::Damage(10.0), &mut ctx, id);
        assert!(ctx.pop_event().is_none());
    }

    #[test]
    fn heal_caps_at_max_health() {
        let (mut ctx, id) = setup();
        run(Command::Damage(5.0), &mut ctx, id);
        run(Command::Heal(50.0), &mut ctx, id);
        assert_eq!(ctx.variables.get("health"), MAX_HEALTH);
    }

    #[test]
    fn collect_item_hides_and_counts() {
        let (mut ctx, id) = setup();
        run(Command::CollectItem, &mut ctx, id);
        assert!(!ctx.scene.get(id).unwrap().visible);
        assert_eq!(ctx.variables.get("coins"), 1.0);
        assert_eq!(ctx.pop_event().map(|q| q.event), Some(Event::ItemCollected));
    }

    #[test]
    fn destroy_removes_owner_and_stops() {
        let (mut ctx, id) = setup();
        assert!(matches!(run(Command::Destroy, &mut ctx, id), Flow::Stop));
        assert!(!ctx.scene.contains(id));
    }

    #[test]
    fn gravity_skips_anchored_objects() {
        let (mut ctx, id) = setup();
        ctx.scene.get_mut(id).unwrap().anchored = true;
        run(Command::Gravity, &mut ctx, id);
        assert!(ctx.animations.is_empty());
    }

    #[test]
    fn say_positions_overlay_above_object() {
        let (mut ctx, id) = setup();
        run(Command::Say { text: "hi".into(), seconds: 2.0 }, &mut ctx, id);
        let out = ctx.drain_host();
        assert_eq!(
            out,
            vec![HostCommand::PositionOverlay {
                object: id,
                text: "hi".into(),
                world: [0.0, 2.0, 0.0],
                seconds: 2.0,
            }]
        );
    }

    #[test]
    fn if_else_picks_branch() {
        let (mut ctx, id) = setup();
        let mut cmd = command(Command::IfElse(Condition::AnyKey));
        cmd.else_children = vec![command(Command::Hide)].into();
        let flow = execute(&cmd, id, &mut ctx, &Program::default());
        assert!(matches!(flow, Flow::Enter(Frame::Sequence { ref commands, .. }) if commands.len() == 1));

        ctx.input.press("x");
        let flow = execute(&cmd, id, &mut ctx, &Program::default());
        assert!(matches!(flow, Flow::Next));
    }

    #[test]
    fn spawn_object_announces_new_id() {
        let (mut ctx, id) = setup();
        run(
            Command::SpawnObject { shape: "sphere".into(), position: Vec3::new(0.0, 5.0, 0.0) },
            &mut ctx,
            id,
        );
        assert_eq!(ctx.scene.len(), 2);
        assert!(matches!(ctx.drain_host()[0], HostCommand::ObjectSpawned { .. }));
    }
}
