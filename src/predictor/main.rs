use crate::config::Config;
use crate::device_camera::interface::DeviceCamera;
use crate::library::logger::interface::Logger;
use crate::library::state_machine::StateMachine;
use crate::prediction_client::interface::PredictionClient;
use crate::predictor::core::{init, transition, Effect, Model, Msg};
use crate::predictor::run_effect::RunEffect;
use std::sync::Arc;

/// The controller: owns the model and wires the core to its collaborators.
pub struct MediaPredictor {
    machine: StateMachine<Model, Msg, Effect>,
}

impl MediaPredictor {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
        prediction_client: Arc<dyn PredictionClient + Send + Sync>,
    ) -> Self {
        let logger = logger.with_namespace("predictor");
        let run_effect = RunEffect::new(
            config.clone(),
            logger.clone(),
            device_camera,
            prediction_client,
        );

        let machine = StateMachine::new(
            init(),
            move |model, msg: Msg| {
                if !matches!(msg, Msg::Tick(_)) {
                    logger.debug(&format!("msg: {}", msg.to_display_string()));
                }
                let (new_model, effects) = transition(&config, model, msg);
                for effect in &effects {
                    logger.debug(&format!("effect: {}", effect.to_display_string()));
                }
                (new_model, effects)
            },
            move |effect, sender| run_effect.run_effect(effect, sender),
        );

        Self { machine }
    }

    pub fn model(&self) -> &Model {
        self.machine.model()
    }

    pub fn dispatch(&mut self, msg: Msg) {
        self.machine.dispatch(msg);
    }

    /// Applies the results effects have reported since the last call.
    pub fn pump(&mut self) -> usize {
        self.machine.pump()
    }
}
