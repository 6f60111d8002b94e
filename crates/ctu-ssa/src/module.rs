// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The SSA module: every flow of one compilation.

use ctu_tree::{DeclId, Type};
use indexmap::IndexMap;

use crate::{Flow, FlowId};

#[derive(Debug, Clone, Default)]
pub struct SsaModule {
    /// Flow arena. A deleted flow leaves `None` so ids stay valid.
    pub flows: Vec<Option<Flow>>,
    /// Declaration of each surviving global, in declaration order.
    pub globals: IndexMap<DeclId, FlowId>,
    pub functions: IndexMap<DeclId, FlowId>,
    /// Named types of all modules.
    pub types: Vec<(String, Type)>,
}

impl SsaModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_flow(&mut self, flow: Flow) -> FlowId {
        let id = FlowId(self.flows.len() as u32);
        self.flows.push(Some(flow));
        id
    }

    /// `None` for an id never allocated or a deleted flow.
    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(id.index()).and_then(Option::as_ref)
    }

    pub fn flow_mut(&mut self, id: FlowId) -> Option<&mut Flow> {
        self.flows.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn global_flow(&self, decl: DeclId) -> Option<FlowId> {
        self.globals.get(&decl).copied()
    }

    pub fn function_flow(&self, decl: DeclId) -> Option<FlowId> {
        self.functions.get(&decl).copied()
    }

    /// Surviving global flows, in declaration order.
    pub fn globals(&self) -> impl Iterator<Item = (FlowId, &Flow)> + '_ {
        self.globals
            .values()
            .filter_map(|&id| self.flow(id).map(|flow| (id, flow)))
    }

    /// Surviving function flows, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (FlowId, &Flow)> + '_ {
        self.functions
            .values()
            .filter_map(|&id| self.flow(id).map(|flow| (id, flow)))
    }

    /// Every surviving flow, in allocation order.
    pub fn live_flows(&self) -> impl Iterator<Item = (FlowId, &Flow)> + '_ {
        self.flows
            .iter()
            .enumerate()
            .filter_map(|(i, flow)| flow.as_ref().map(|flow| (FlowId(i as u32), flow)))
    }

    pub fn live_ids(&self) -> Vec<FlowId> {
        self.live_flows().map(|(id, _)| id).collect()
    }

    /// Look up a surviving global by name.
    pub fn find_global(&self, name: &str) -> Option<FlowId> {
        self.globals().find(|(_, f)| f.name == name).map(|(id, _)| id)
    }

    pub fn find_function(&self, name: &str) -> Option<FlowId> {
        self.functions().find(|(_, f)| f.name == name).map(|(id, _)| id)
    }

    /// Delete a flow, leaving a tombstone. Returns the removed flow.
    pub fn remove_flow(&mut self, id: FlowId) -> Option<Flow> {
        let flow = self.flows.get_mut(id.index())?.take()?;
        self.globals.retain(|_, f| *f != id);
        self.functions.retain(|_, f| *f != id);
        Some(flow)
    }

    pub fn live_steps(&self) -> usize {
        self.live_flows().map(|(_, f)| f.live_steps()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlowKind;
    use ctu_tree::Visibility;

    #[test]
    fn removal_leaves_tombstone() {
        let mut module = SsaModule::new();
        let a = module.add_flow(Flow::new(FlowKind::Global, "a", Type::int(), Visibility::Private));
        let b = module.add_flow(Flow::new(FlowKind::Function, "b", Type::Void, Visibility::Public));
        module.globals.insert(DeclId(0), a);
        module.functions.insert(DeclId(1), b);

        assert!(module.remove_flow(a).is_some());
        assert!(module.flow(a).is_none());
        assert!(module.remove_flow(a).is_none());
        assert_eq!(module.globals().count(), 0);
        assert_eq!(module.find_function("b"), Some(b));
        assert_eq!(module.live_ids(), vec![b]);
    }
}
