use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{
    application_context::SceneContext, common::driver::SharedDriver, errors::EngineError,
};

/// A unit of the application with an enter/update/exit lifecycle.
///
/// Everything acquired in [`on_enter`](Scene::on_enter) belongs to the scene
/// and must be released no later than [`on_exit`](Scene::on_exit).
pub trait Scene {
    fn on_enter(&mut self, context: &mut SceneContext) -> Result<(), EngineError>;
    /// Called once per frame with the time since the previous frame.
    fn on_update(&mut self, context: &mut SceneContext, elapsed: Duration);
    fn on_exit(&mut self, _context: &mut SceneContext) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Pending,
    Running,
    Exited,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Drives one scene through its lifecycle, independent of any window.
///
/// `on_enter` runs at most once, `on_update` only while the scene is
/// running and `on_exit` exactly once after a successful enter.
pub struct SceneHost<S> {
    scene: S,
    context: SceneContext,
    lifecycle: Lifecycle,
    started: Option<Instant>,
    last_frame: Option<Instant>,
}

impl<S> SceneHost<S>
where
    S: Scene,
{
    pub fn new(scene: S, driver: SharedDriver) -> Self {
        Self {
            scene,
            context: SceneContext::new(driver),
            lifecycle: Lifecycle::Pending,
            started: None,
            last_frame: None,
        }
    }

    pub fn enter(&mut self, now: Instant) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Pending {
            warn!(lifecycle = ?self.lifecycle, "scene entered twice");
            return Ok(());
        }
        self.started = Some(now);
        self.last_frame = Some(now);
        match self.scene.on_enter(&mut self.context) {
            Ok(()) => {
                info!("entered scene");
                self.lifecycle = Lifecycle::Running;
                Ok(())
            }
            Err(e) => {
                self.lifecycle = Lifecycle::Failed;
                Err(e)
            }
        }
    }

    /// Runs one frame stamped `now`.
    pub fn frame(&mut self, now: Instant) -> Flow {
        if self.lifecycle != Lifecycle::Running {
            return Flow::Exit;
        }
        let elapsed = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        if let Some(started) = self.started {
            self.context.set_time(now.saturating_duration_since(started));
        }
        self.context.clear();
        self.scene.on_update(&mut self.context, elapsed);
        if self.context.exit_requested() {
            Flow::Exit
        } else {
            Flow::Continue
        }
    }

    pub fn exit(&mut self) {
        if self.lifecycle == Lifecycle::Running {
            self.scene.on_exit(&mut self.context);
            self.lifecycle = Lifecycle::Exited;
            info!("exited scene");
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use winit::keyboard::NamedKey;

    use super::*;
    use crate::{common::headless::HeadlessDriver, errors::GlError};

    #[derive(Default)]
    struct Recorder {
        fail_enter: bool,
        calls: Vec<String>,
    }

    impl Scene for Recorder {
        fn on_enter(&mut self, _context: &mut SceneContext) -> Result<(), EngineError> {
            self.calls.push("enter".to_string());
            if self.fail_enter {
                return Err(GlError::ProgramLink("boom".to_string()).into());
            }
            Ok(())
        }

        fn on_update(&mut self, context: &mut SceneContext, elapsed: Duration) {
            self.calls.push(format!(
                "update {}ms at {}ms",
                elapsed.as_millis(),
                context.time().as_millis()
            ));
            if context.is_key_pressed(NamedKey::Escape) {
                context.exit();
            }
        }

        fn on_exit(&mut self, _context: &mut SceneContext) {
            self.calls.push("exit".to_string());
        }
    }

    fn host(scene: Recorder) -> (Rc<HeadlessDriver>, SceneHost<Recorder>) {
        let headless = Rc::new(HeadlessDriver::new());
        let host = SceneHost::new(scene, headless.clone());
        (headless, host)
    }

    #[test]
    fn frames_carry_delta_and_total_time() {
        let (headless, mut host) = host(Recorder::default());
        let start = Instant::now();
        host.enter(start).unwrap();
        assert_eq!(host.frame(start + Duration::from_millis(16)), Flow::Continue);
        assert_eq!(host.frame(start + Duration::from_millis(40)), Flow::Continue);
        host.exit();
        host.exit();
        assert_eq!(
            host.scene().calls,
            ["enter", "update 16ms at 16ms", "update 24ms at 40ms", "exit"]
        );
        assert_eq!(host.lifecycle(), Lifecycle::Exited);
        assert_eq!(headless.clear_count(), 2);
    }

    #[test]
    fn escape_requests_exit() {
        let (_, mut host) = host(Recorder::default());
        let start = Instant::now();
        host.enter(start).unwrap();
        host.context_mut().press_key(NamedKey::Escape);
        assert_eq!(host.frame(start), Flow::Exit);
    }

    #[test]
    fn failed_enter_never_updates_or_exits() {
        let (_, mut host) = host(Recorder {
            fail_enter: true,
            ..Default::default()
        });
        let start = Instant::now();
        assert!(matches!(host.enter(start), Err(EngineError::Gl(_))));
        assert_eq!(host.frame(start), Flow::Exit);
        host.exit();
        assert_eq!(host.scene().calls, ["enter"]);
        assert_eq!(host.lifecycle(), Lifecycle::Failed);
    }

    #[test]
    fn clear_color_reaches_the_driver_only_when_changed() {
        let (headless, mut host) = host(Recorder::default());
        let start = Instant::now();
        host.enter(start).unwrap();
        host.context_mut().set_clear_color(0.2, 0.3, 0.3);
        host.frame(start);
        assert_eq!(headless.clear_color(), Some([0.2, 0.3, 0.3, 1.0]));
        host.context_mut().resize(800, 600);
        assert_eq!(headless.viewport(), Some((800, 600)));
    }
}
