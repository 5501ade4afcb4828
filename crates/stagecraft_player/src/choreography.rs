// SPDX-License-Identifier: MIT OR Apache-2.0
//! The demo choreography.
//!
//! Two actors grow in, round off, bounce, converge into a stack and shrink
//! away. A third thread only plays a sound once the first actor has grown.
//!
//! Barrier order per thread:
//! - thing1: all, sound, thing2, thing2, thing1+thing2, thing2
//! - thing2: all, thing1, thing1, thing1+thing2, thing1
//! - sound: all, thing1

use crate::audio::SoundCue;
use crate::scene::{palette, Cast, Scene, Thing};
use stagecraft_sequencer::{Stage, ThreadCtx, Wait};

/// Time for both actors to meet in the middle
const CONVERGE: f64 = 0.3;
/// Time for the closing shrink
const SHRINK: f64 = 0.4;

/// Bind the three thread bodies and record their IDs in the scene.
///
/// Threads already present in the stage's sequencer under the same names are
/// reused, so this also reattaches bodies after a reload.
pub fn install(stage: &mut Stage<Scene>, scene: &mut Scene) -> Cast {
    let cast = Cast {
        thing1: stage.bind_thread("thing1", thing1),
        thing2: stage.bind_thread("thing2", thing2),
        sound: stage.bind_thread("sound", sound),
    };
    scene.cast = Some(cast);
    cast
}

/// Hop up `height` and land back where the hop started
fn bounce(ctx: &mut ThreadCtx<'_>, thing: &mut Thing, height: f32, duration: f64) -> Wait {
    let base = ctx.local(|| thing.position[1]).get();
    let wait = ctx.lerp_multi_start(duration);

    let mut t = 0.0;
    if ctx.lerp_multi(&mut t, 0.0, 1.0) {
        thing.position[1] = base - height * 4.0 * t * (1.0 - t);
    }
    wait
}

fn thing1(ctx: &mut ThreadCtx<'_>, scene: &mut Scene) {
    let Some(cast) = scene.cast else { return };

    ctx.once(|| scene.camera.rotation = 0.0);
    ctx.once(|| scene.thing1 = Thing::new([-200.0, 0.0], 0.0, palette::RED, 1.5));
    let slowness = f64::from(scene.thing1.slowness);

    ctx.sleep(0.25);
    ctx.sync_all(&cast.all());

    // grow in while softening the other actor
    ctx.lerp_multi_start(0.3 * slowness);
    ctx.lerp_multi(&mut scene.thing1.size, 0.0, 200.0);
    ctx.lerp_multi(&mut scene.thing2.roundness, 1.0, 0.5);
    ctx.once(|| scene.cue(SoundCue::Soft));
    ctx.sleep(0.25);

    ctx.sync_with(cast.sound);
    ctx.squerp(0.3 * slowness, &mut scene.thing1.roundness, 0.0, 0.5);
    ctx.sleep(0.2);

    ctx.sync_with(cast.thing2);
    bounce(ctx, &mut scene.thing1, 20.0, 0.5);

    ctx.sync_with(cast.thing2);
    ctx.lerp_multi_start(CONVERGE);
    ctx.lerp_multi(&mut scene.thing1.position[0], -200.0, 0.0);
    ctx.sqrt_multi(&mut scene.thing1.roundness, 0.5, 0.0);

    ctx.sync_both(cast.thing1, cast.thing2);
    ctx.sleep(0.25);
    ctx.squerp(SHRINK, &mut scene.thing1.size, 200.0, 0.0);
    ctx.sync_with(cast.thing2);
}

fn thing2(ctx: &mut ThreadCtx<'_>, scene: &mut Scene) {
    let Some(cast) = scene.cast else { return };

    ctx.once(|| scene.thing2 = Thing::new([200.0, 0.0], 1.0, palette::GREEN, 1.0));
    let slowness = f64::from(scene.thing2.slowness);

    ctx.once(|| scene.cue(SoundCue::Soft));
    ctx.lerp(0.3 * slowness, &mut scene.thing2.size, 0.0, 150.0);
    ctx.sleep(0.4);
    ctx.sync_all(&cast.all());

    ctx.sync_with(cast.thing1);
    ctx.sleep(0.1);
    bounce(ctx, &mut scene.thing2, 30.0, 0.5);
    ctx.sleep(0.1);

    ctx.sync_with(cast.thing1);
    // land on top of thing1 as it slides to the middle
    let start = ctx.local(|| scene.thing2.position).get();
    ctx.lerp_multi_start(CONVERGE);
    let stacked_y = scene.thing1.position[1] - (scene.thing1.size + scene.thing2.size) / 2.0;
    ctx.lerp_multi(&mut scene.thing2.position[0], start[0], 0.0);
    ctx.squerp_multi(&mut scene.thing2.position[1], start[1], stacked_y);
    ctx.once(|| scene.cue(SoundCue::Kick));

    ctx.sync_both(cast.thing1, cast.thing2);
    ctx.sleep(0.25);
    ctx.squerp(SHRINK, &mut scene.thing2.size, 150.0, 0.0);

    ctx.sync_with(cast.thing1);
    ctx.once(|| {
        scene.finished = true;
        tracing::info!("Choreography finished");
    });
}

fn sound(ctx: &mut ThreadCtx<'_>, scene: &mut Scene) {
    let Some(cast) = scene.cast else { return };

    ctx.sync_all(&cast.all());
    ctx.sync_with(cast.thing1);
    // land just before thing1 finishes rounding off
    ctx.sleep(0.3 * f64::from(scene.thing1.slowness) - 0.08);
    ctx.once(|| scene.cue(SoundCue::Soft));
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn run_to_finish(stage: &mut Stage<Scene>, scene: &mut Scene, cues: &mut Vec<SoundCue>) -> usize {
        for frame in 0..600 {
            stage.update(DT, scene);
            cues.extend(scene.drain_cues());
            if scene.finished {
                return frame;
            }
        }
        panic!("choreography did not finish");
    }

    #[test]
    fn test_install_names_threads() {
        let mut stage = Stage::new();
        let mut scene = Scene::new();
        let cast = install(&mut stage, &mut scene);

        assert_eq!(scene.cast, Some(cast));
        let seq = stage.sequencer();
        assert_eq!(seq.thread(cast.thing1).unwrap().name(), "thing1");
        assert_eq!(seq.thread(cast.thing2).unwrap().name(), "thing2");
        assert_eq!(seq.thread(cast.sound).unwrap().name(), "sound");
    }

    #[test]
    fn test_first_frame_initializes_actors() {
        let mut stage = Stage::new();
        let mut scene = Scene::new();
        install(&mut stage, &mut scene);

        stage.update(DT, &mut scene);
        assert_eq!(scene.thing1.position, [-200.0, 0.0]);
        assert_eq!(scene.thing1.slowness, 1.5);
        assert_eq!(scene.thing2.color, palette::GREEN);
        // one-shot steps do not delay the grow, so the first frame already counts
        let expected = 150.0 * (DT / 0.3) as f32;
        assert!((scene.thing2.size - expected).abs() < 1e-3);
        assert_eq!(scene.drain_cues(), vec![SoundCue::Soft]);
    }

    #[test]
    fn test_late_cast_does_not_skip_grow() {
        let mut stage = Stage::new();
        let mut scene = Scene::new();
        let cast = install(&mut stage, &mut scene);

        scene.cast = None;
        for _ in 0..120 {
            stage.update(DT, &mut scene);
        }
        assert_eq!(scene.thing2.size, 0.0);

        scene.cast = Some(cast);
        stage.update(DT, &mut scene);
        let expected = 150.0 * (DT / 0.3) as f32;
        assert!((scene.thing2.size - expected).abs() < 1e-3);
    }

    #[test]
    fn test_plays_through() {
        let mut stage = Stage::new();
        let mut scene = Scene::new();
        install(&mut stage, &mut scene);

        let mut cues = Vec::new();
        let frames = run_to_finish(&mut stage, &mut scene, &mut cues);
        assert!(frames > 60);

        assert_eq!(scene.thing1.position[0], 0.0);
        assert_eq!(scene.thing2.position, [0.0, -175.0]);
        assert_eq!(scene.thing1.size, 0.0);
        assert_eq!(scene.thing2.size, 0.0);
        assert_eq!(scene.thing1.roundness, 0.0);
        assert_eq!(scene.thing2.roundness, 0.5);

        assert_eq!(cues.iter().filter(|c| **c == SoundCue::Soft).count(), 3);
        assert_eq!(cues.iter().filter(|c| **c == SoundCue::Kick).count(), 1);

        // every thread is parked past its last step
        for _ in 0..10 {
            stage.update(DT, &mut scene);
        }
        assert!(scene.drain_cues().is_empty());
    }

    #[test]
    fn test_restart_replays() {
        let mut stage = Stage::new();
        let mut scene = Scene::new();
        install(&mut stage, &mut scene);

        let mut cues = Vec::new();
        let first = run_to_finish(&mut stage, &mut scene, &mut cues);

        stage.restart();
        scene.reset();
        cues.clear();
        let second = run_to_finish(&mut stage, &mut scene, &mut cues);

        assert_eq!(first, second);
        assert_eq!(cues.len(), 4);
    }
}
