//! Template factory exposed to pool code.

use template_core::{BlockTemplate, CoinFamily, RpcBlockData, SeedHashChain, TemplateBuilder};
use wasm_bindgen::prelude::*;

use crate::convert::{from_js, to_js, to_js_error};

/// Builds block templates for one pool address.
///
/// Owns the seed hash chain, so consecutive heights in the same or the next
/// epoch cost at most one Keccak round.
#[wasm_bindgen]
pub struct TemplateFactory {
    builder: TemplateBuilder,
    seeds: SeedHashChain,
}

#[wasm_bindgen]
impl TemplateFactory {
    /// Create a factory.
    ///
    /// # Arguments
    /// * `pool_address` - Base58check address receiving the coinbase
    /// * `family` - Coin family name, e.g. "raven"
    #[wasm_bindgen(constructor)]
    pub fn new(pool_address: &str, family: &str) -> Result<TemplateFactory, JsValue> {
        let family: CoinFamily = family.parse().map_err(to_js_error)?;
        let builder = TemplateBuilder::new(pool_address, family).map_err(to_js_error)?;
        Ok(TemplateFactory {
            builder,
            seeds: SeedHashChain::new(),
        })
    }

    /// Build a template from a `getblocktemplate` result object.
    #[wasm_bindgen(js_name = ravenBlockTemplate)]
    pub fn raven_block_template(&mut self, rpc_data: JsValue) -> Result<JsValue, JsValue> {
        let rpc: RpcBlockData = from_js(rpc_data)?;
        let template = self.build(&rpc).map_err(to_js_error)?;
        to_js(&template)
    }

    /// Same as `ravenBlockTemplate`, taking and returning JSON text.
    #[wasm_bindgen(js_name = ravenBlockTemplateJson)]
    pub fn raven_block_template_json(&mut self, rpc_json: &str) -> Result<String, JsValue> {
        self.build_json(rpc_json).map_err(to_js_error)
    }

    /// Address the coinbase pays to.
    #[wasm_bindgen(getter, js_name = poolAddress)]
    pub fn pool_address(&self) -> String {
        self.builder.pool_address().display().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn family(&self) -> String {
        self.builder.family().to_string()
    }
}

impl TemplateFactory {
    fn build(&mut self, rpc: &RpcBlockData) -> template_core::Result<BlockTemplate> {
        self.builder.build(rpc, &mut self.seeds)
    }

    fn build_json(&mut self, rpc_json: &str) -> template_core::Result<String> {
        let rpc = RpcBlockData::from_json(rpc_json)?;
        self.build(&rpc)?.to_json()
    }
}
