use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;

type TransitionFn<TModel, TMsg, TEffect> =
    dyn Fn(TModel, TMsg) -> (TModel, Vec<TEffect>) + Send + Sync;

type RunEffectFn<TEffect, TMsg> = dyn Fn(TEffect, Sender<TMsg>) + Send + Sync;

/// Owns the model and applies messages to it on the calling thread.
///
/// Effects run on their own threads and report back by sending messages
/// through the channel, which the owner drains with [`StateMachine::pump`].
pub struct StateMachine<TModel, TMsg, TEffect> {
    model: TModel,
    transition_fn: Arc<TransitionFn<TModel, TMsg, TEffect>>,
    run_effect_fn: Arc<RunEffectFn<TEffect, TMsg>>,
    msg_sender: Sender<TMsg>,
    msg_receiver: Receiver<TMsg>,
}

impl<TModel, TMsg, TEffect> StateMachine<TModel, TMsg, TEffect>
where
    TModel: Default,
    TMsg: Send + 'static,
    TEffect: Send + 'static,
{
    pub fn new<T, E>(init: (TModel, Vec<TEffect>), transition_fn: T, run_effect_fn: E) -> Self
    where
        T: Fn(TModel, TMsg) -> (TModel, Vec<TEffect>) + Send + Sync + 'static,
        E: Fn(TEffect, Sender<TMsg>) + Send + Sync + 'static,
    {
        let (msg_sender, msg_receiver) = channel();
        let (model, effects) = init;

        let machine = Self {
            model,
            transition_fn: Arc::new(transition_fn),
            run_effect_fn: Arc::new(run_effect_fn),
            msg_sender,
            msg_receiver,
        };

        machine.spawn_effects(effects);

        machine
    }

    pub fn model(&self) -> &TModel {
        &self.model
    }

    pub fn dispatch(&mut self, msg: TMsg) {
        let model = std::mem::take(&mut self.model);
        let (new_model, effects) = (self.transition_fn)(model, msg);
        self.model = new_model;
        self.spawn_effects(effects);
    }

    /// Applies every message that is already waiting and returns how many there were.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        loop {
            match self.msg_receiver.try_recv() {
                Ok(msg) => {
                    self.dispatch(msg);
                    processed += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return processed,
            }
        }
    }

    fn spawn_effects(&self, effects: Vec<TEffect>) {
        for effect in effects {
            let effect_sender = self.msg_sender.clone();
            let run_effect_fn = Arc::clone(&self.run_effect_fn);
            std::thread::spawn(move || {
                run_effect_fn(effect, effect_sender);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    enum Msg {
        Increment,
        Echo(u32),
    }

    fn transition(model: Counter, msg: Msg) -> (Counter, Vec<u32>) {
        match msg {
            Msg::Increment => (
                Counter {
                    value: model.value + 1,
                },
                vec![model.value + 1],
            ),
            Msg::Echo(n) => (
                Counter {
                    value: model.value + n,
                },
                vec![],
            ),
        }
    }

    #[test]
    fn effects_feed_messages_back_into_the_model() {
        let mut machine = StateMachine::new(
            (Counter::default(), vec![10]),
            transition,
            |effect: u32, sender: Sender<Msg>| {
                let _ = sender.send(Msg::Echo(effect));
            },
        );

        machine.dispatch(Msg::Increment);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut processed = 0;
        while processed < 2 && Instant::now() < deadline {
            processed += machine.pump();
            std::thread::sleep(Duration::from_millis(1));
        }

        // 1 from Increment, 10 from the init effect, 1 echoed back.
        assert_eq!(machine.model().value, 12);
    }
}
