//! WASM bindings for Phasor Core.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmNetwork } from 'phasor_core';
//!
//! await init();
//!
//! const net = new WasmNetwork(`
//!   class: DcVoltageSource; voltage: 10; input: [0, 0]; output: [0, 1]
//!   class: Resistor; resistance: 20; input: [0, 1]; output: [0, 0]
//! `);
//! net.evaluate();
//! const currents = net.currents_at(0.0); // Float64Array, one per component
//! ```

use wasm_bindgen::prelude::*;

use crate::error::NetworkError;
use crate::network::{Network, NetworkConfig};
use crate::persist;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(err: NetworkError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-compatible network wrapper.
#[wasm_bindgen]
pub struct WasmNetwork {
    network: Network,
}

#[wasm_bindgen]
impl WasmNetwork {
    /// Load a network from its saved text form.
    #[wasm_bindgen(constructor)]
    pub fn new(text: &str) -> Result<WasmNetwork, JsValue> {
        Self::with_merge_radius(text, crate::DEFAULT_MERGE_RADIUS)
    }

    /// Load a network with a custom terminal snapping radius.
    #[wasm_bindgen]
    pub fn with_merge_radius(text: &str, merge_radius: f64) -> Result<WasmNetwork, JsValue> {
        let config = NetworkConfig::new().with_merge_radius(merge_radius);
        let network = persist::load_network(text, config).map_err(to_js)?;
        Ok(WasmNetwork { network })
    }

    /// Solve the network if anything changed.
    #[wasm_bindgen]
    pub fn evaluate(&mut self) -> Result<(), JsValue> {
        self.network.evaluate(false).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn is_valid(&self) -> bool {
        self.network.is_valid()
    }

    /// Instantaneous current of every component at `t`, in component order.
    #[wasm_bindgen]
    pub fn currents_at(&self, t: f64) -> Result<Vec<f64>, JsValue> {
        self.network
            .components()
            .map(|c| self.network.branch_current(c.id, t))
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_js)
    }

    /// Simulated angular frequencies, DC first.
    #[wasm_bindgen]
    pub fn angular_frequencies(&self) -> Vec<f64> {
        self.network.simulated_angular_frequencies().to_vec()
    }

    /// Saved text form of the network.
    #[wasm_bindgen]
    pub fn save(&self) -> String {
        persist::save_network(&self.network)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
