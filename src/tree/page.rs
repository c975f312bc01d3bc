use std::collections::HashMap;

use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use super::Control;
use super::ControlId;
use super::ControlKind;
use super::HtmlWriter;
use super::NodeState;
use super::Phase;
use super::PostbackData;
use crate::client_attributes;
use crate::display_of;
use crate::Error;
use crate::Result;
use crate::StateError;
use crate::ValidationConfig;
use crate::ValidationSourceRegistry;
use crate::ValidatorCallbacks;
use crate::ValidatorDisplay;

/// Server-side event handler attached to a control by unique id.
pub type EventHandler = Box<dyn FnMut(&mut Page, ControlId) -> Result<()> + Send>;

/// Output of a full request cycle.
#[derive(Debug)]
pub struct PageResponse {
    pub html: String,
    /// Serialized view-state delta; the host persists and returns it
    /// verbatim on the next postback.
    pub view_state: Vec<u8>,
    pub is_valid: bool,
}

/// A control tree plus the lifecycle, postback, and validation registries
/// scoped to one request. No tree state is shared across requests.
pub struct Page {
    arena: Vec<Option<Control>>,
    root: ControlId,
    phase: Phase,
    is_postback: bool,
    validators: Vec<ControlId>,
    postback_targets: Vec<ControlId>,
    changed: Vec<ControlId>,
    changed_handlers: HashMap<String, EventHandler>,
    click_handlers: HashMap<String, EventHandler>,
    callbacks: ValidatorCallbacks,
    sources: ValidationSourceRegistry,
    config: ValidationConfig,
    page_valid: bool,
}

impl Page {
    pub fn new(config: ValidationConfig) -> Self {
        let mut root = Control::new("page", ControlKind::Page);
        root.naming_container = true;
        Self {
            arena: vec![Some(root)],
            root: ControlId(0),
            phase: Phase::Created,
            is_postback: false,
            validators: Vec::new(),
            postback_targets: Vec::new(),
            changed: Vec::new(),
            changed_handlers: HashMap::new(),
            click_handlers: HashMap::new(),
            callbacks: ValidatorCallbacks::default(),
            sources: ValidationSourceRegistry::default(),
            config,
            page_valid: true,
        }
    }

    pub fn root(&self) -> ControlId {
        self.root
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_postback(&self) -> bool {
        self.is_postback
    }

    /// Aggregate validity: true iff every enabled, visible validator
    /// reported valid during the last `validate` call.
    pub fn is_valid(&self) -> bool {
        self.page_valid
    }

    pub(crate) fn set_page_valid(
        &mut self,
        valid: bool,
    ) {
        self.page_valid = valid;
    }

    pub fn get(
        &self,
        id: ControlId,
    ) -> Option<&Control> {
        self.arena.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(
        &mut self,
        id: ControlId,
    ) -> Option<&mut Control> {
        self.arena.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn validators(&self) -> &[ControlId] {
        &self.validators
    }

    pub(crate) fn callbacks(&self) -> &ValidatorCallbacks {
        &self.callbacks
    }

    pub(crate) fn sources(&self) -> &ValidationSourceRegistry {
        &self.sources
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn register_callback(
        &mut self,
        name: impl Into<String>,
        callback: crate::CustomCallback,
    ) {
        self.callbacks.register(name, callback);
    }

    pub fn register_validation_source(
        &mut self,
        kind_key: impl Into<String>,
        source: Box<dyn crate::ValidationSource>,
    ) {
        self.sources.register(kind_key, source);
    }

    // ===== Tree construction =====

    /// Adds `control` under `parent`. The identifier must be unique among
    /// its siblings. Validators and postback-aware controls register into
    /// their page-scoped collections here; controls created after Init
    /// (dynamic creation during event handling) catch up on tracking.
    pub fn add_control(
        &mut self,
        parent: ControlId,
        mut control: Control,
    ) -> Result<ControlId> {
        let siblings = self
            .get(parent)
            .ok_or_else(|| Error::Fatal(format!("parent control {:?} does not exist", parent)))?
            .children
            .clone();
        for sibling in &siblings {
            if let Some(existing) = self.get(*sibling) {
                if existing.id == control.id {
                    return Err(Error::Fatal(format!(
                        "duplicate control id '{}' among siblings",
                        control.id
                    )));
                }
            }
        }

        control.parent = Some(parent);
        if self.phase >= Phase::Init {
            control.state.track();
        }
        let is_validator = matches!(control.kind, ControlKind::Validator(_));
        let is_postback_aware = control.is_postback_aware();

        let id = ControlId(self.arena.len());
        self.arena.push(Some(control));
        if let Some(parent_control) = self.get_mut(parent) {
            parent_control.children.push(id);
        }

        if is_validator {
            self.validators.push(id);
        }
        if is_postback_aware {
            self.postback_targets.push(id);
        }
        Ok(id)
    }

    /// Removes a control and its subtree. The nodes leave the validator
    /// and postback registries immediately, so they neither appear in
    /// SaveState output nor get targeted by later phases.
    pub fn remove_control(
        &mut self,
        id: ControlId,
    ) -> Result<()> {
        if id == self.root {
            return Err(Error::Fatal("the root control cannot be removed".to_string()));
        }
        let control = self
            .get(id)
            .ok_or_else(|| Error::Fatal(format!("control {:?} does not exist", id)))?;
        let parent = control.parent;

        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);

        // Resolve unique ids before detaching anything; descendants lose
        // their naming chain once ancestors leave the arena.
        let unique_ids: Vec<Option<String>> =
            subtree.iter().map(|node| self.unique_id(*node)).collect();

        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }

        for (node, uid) in subtree.into_iter().zip(unique_ids) {
            if let Some(uid) = uid {
                self.changed_handlers.remove(&uid);
                self.click_handlers.remove(&uid);
            }
            self.validators.retain(|v| *v != node);
            self.postback_targets.retain(|t| *t != node);
            self.changed.retain(|c| *c != node);
            self.arena[node.0] = None;
        }
        Ok(())
    }

    fn collect_subtree(
        &self,
        id: ControlId,
        out: &mut Vec<ControlId>,
    ) {
        out.push(id);
        if let Some(control) = self.get(id) {
            for child in &control.children {
                self.collect_subtree(*child, out);
            }
        }
    }

    /// Live controls in top-down (preorder) order.
    pub fn preorder(&self) -> Vec<ControlId> {
        let mut out = Vec::new();
        self.collect_subtree(self.root, &mut out);
        out
    }

    // ===== Naming =====

    /// Fully qualified identifier: naming-container ancestor ids joined
    /// with `$`. The root page contributes no segment.
    pub fn unique_id(
        &self,
        id: ControlId,
    ) -> Option<String> {
        let control = self.get(id)?;
        let mut segments = vec![control.id.clone()];
        let mut cursor = control.parent;
        while let Some(ancestor_id) = cursor {
            if ancestor_id == self.root {
                break;
            }
            let ancestor = self.get(ancestor_id)?;
            if ancestor.naming_container {
                segments.push(ancestor.id.clone());
            }
            cursor = ancestor.parent;
        }
        segments.reverse();
        Some(segments.join("$"))
    }

    /// Client-side element id: the unique id with `$` flattened to `_`.
    pub fn client_id(
        &self,
        id: ControlId,
    ) -> Option<String> {
        self.unique_id(id).map(|uid| uid.replace('$', "_"))
    }

    pub fn find_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Option<ControlId> {
        self.preorder()
            .into_iter()
            .find(|id| self.unique_id(*id).as_deref() == Some(unique_id))
    }

    /// Nearest naming-container ancestor establishing `id`'s resolution
    /// scope.
    pub fn naming_container_of(
        &self,
        id: ControlId,
    ) -> ControlId {
        let mut cursor = self.get(id).and_then(|c| c.parent);
        while let Some(ancestor_id) = cursor {
            match self.get(ancestor_id) {
                Some(ancestor) if ancestor.naming_container => return ancestor_id,
                Some(ancestor) => cursor = ancestor.parent,
                None => break,
            }
        }
        self.root
    }

    /// Resolves `name` within the naming scope rooted at `scope`.
    /// `$`-separated names traverse nested naming containers.
    pub fn find_control(
        &self,
        scope: ControlId,
        name: &str,
    ) -> Option<ControlId> {
        let mut current = scope;
        let mut segments = name.split('$').peekable();
        while let Some(segment) = segments.next() {
            let found = self.find_in_scope(current, segment)?;
            if segments.peek().is_none() {
                return Some(found);
            }
            // Intermediate segments must themselves establish a scope.
            if !self.get(found)?.naming_container {
                return None;
            }
            current = found;
        }
        None
    }

    /// Breadth-first search of `scope`'s descendants, matching nested
    /// naming containers themselves but never descending into them.
    fn find_in_scope(
        &self,
        scope: ControlId,
        name: &str,
    ) -> Option<ControlId> {
        let mut frontier: Vec<ControlId> = self.get(scope)?.children.clone();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                let control = self.get(id)?;
                if control.id == name {
                    return Some(id);
                }
                if !control.naming_container {
                    next.extend(control.children.iter().copied());
                }
            }
            frontier = next;
        }
        None
    }

    /// A control renders/validates only when it and all ancestors are
    /// visible.
    pub fn is_effectively_visible(
        &self,
        id: ControlId,
    ) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.get(current) {
                Some(control) if !control.visible => return false,
                Some(control) => cursor = control.parent,
                None => return false,
            }
        }
        true
    }

    // ===== Event wiring =====

    pub fn on_changed(
        &mut self,
        unique_id: impl Into<String>,
        handler: EventHandler,
    ) {
        self.changed_handlers.insert(unique_id.into(), handler);
    }

    pub fn on_click(
        &mut self,
        unique_id: impl Into<String>,
        handler: EventHandler,
    ) {
        self.click_handlers.insert(unique_id.into(), handler);
    }

    // ===== Lifecycle phases =====

    fn advance(
        &mut self,
        expected: Phase,
        next: Phase,
    ) -> Result<()> {
        if self.phase != expected {
            return Err(Error::Fatal(format!(
                "lifecycle violation: {} requested while in {}",
                next.name(),
                self.phase.name()
            )));
        }
        trace!("lifecycle phase: {} -> {}", self.phase.name(), next.name());
        self.phase = next;
        Ok(())
    }

    /// Init: top-down. Tracking starts here, so template defaults set
    /// during construction stay out of the persisted delta.
    pub fn init(&mut self) -> Result<()> {
        self.advance(Phase::Created, Phase::Init)?;
        for id in self.preorder() {
            if let Some(control) = self.get_mut(id) {
                control.state.track();
            }
        }
        Ok(())
    }

    /// LoadState: restores state bags from the positional persisted
    /// structure, top-down. A structural mismatch is fatal for that
    /// subtree only; siblings continue and the first corruption error is
    /// surfaced to the caller.
    pub fn load_state(
        &mut self,
        state: Option<&NodeState>,
    ) -> Result<()> {
        self.advance(Phase::Init, Phase::LoadState)?;
        let Some(state) = state else {
            return Ok(());
        };

        let mut errors = Vec::new();
        self.apply_node_state(self.root, state, &mut errors);
        match errors.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }

    fn apply_node_state(
        &mut self,
        id: ControlId,
        state: &NodeState,
        errors: &mut Vec<Error>,
    ) {
        if let Some(entries) = &state.bag {
            if let Some(control) = self.get_mut(id) {
                control.state.load(entries.clone());
            }
        }

        let children = match self.get(id) {
            Some(control) => control.children.clone(),
            None => return,
        };
        for (position, child_state) in &state.children {
            match children.get(*position) {
                Some(child) => self.apply_node_state(*child, child_state, errors),
                None => {
                    let control = self
                        .unique_id(id)
                        .unwrap_or_else(|| format!("{:?}", id));
                    warn!(
                        "view state shape mismatch under '{}': child position {} out of range ({} children)",
                        control,
                        position,
                        children.len()
                    );
                    errors.push(Error::State(StateError::Corruption {
                        control,
                        detail: format!(
                            "child position {} out of range ({} children)",
                            position,
                            children.len()
                        ),
                    }));
                }
            }
        }
    }

    /// LoadPostbackData: delivers submitted values to the registered
    /// postback-aware nodes and records which of them changed.
    pub fn load_postback_data(
        &mut self,
        data: &PostbackData,
    ) -> Result<()> {
        self.advance(Phase::LoadState, Phase::LoadPostbackData)?;
        for id in self.postback_targets.clone() {
            let Some(uid) = self.unique_id(id) else { continue };
            let Some(posted) = data.get(&uid) else { continue };
            let Some(control) = self.get_mut(id) else { continue };

            if matches!(control.kind, ControlKind::TextBox) && control.text() != posted {
                let posted = posted.to_string();
                control.set_text(posted);
                debug!("postback changed '{}'", uid);
                self.changed.push(id);
            }
        }
        Ok(())
    }

    /// RaiseChangedEvents: fires change handlers for the nodes whose
    /// posted value differed. Handler failures are logged, not fatal.
    pub fn raise_changed_events(&mut self) -> Result<()> {
        self.advance(Phase::LoadPostbackData, Phase::RaiseChangedEvents)?;
        for id in std::mem::take(&mut self.changed) {
            self.dispatch(id, EventSlot::Changed);
        }
        Ok(())
    }

    /// RaisePostbackEvent: resolves the event target by unique id. A
    /// missing target is reported and skipped; the page continues
    /// processing remaining phases.
    pub fn raise_postback_event(
        &mut self,
        data: &PostbackData,
    ) -> Result<()> {
        self.advance(Phase::RaiseChangedEvents, Phase::RaisePostbackEvent)?;
        let Some(target) = data.event_target() else {
            return Ok(());
        };
        match self.find_by_unique_id(target) {
            Some(id) => self.dispatch(id, EventSlot::Click),
            None => warn!("postback event target '{}' not found; continuing", target),
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        id: ControlId,
        slot: EventSlot,
    ) {
        let Some(uid) = self.unique_id(id) else { return };
        let handlers = match slot {
            EventSlot::Changed => &mut self.changed_handlers,
            EventSlot::Click => &mut self.click_handlers,
        };
        let Some(mut handler) = handlers.remove(&uid) else {
            debug!("no {:?} handler registered for '{}'", slot, uid);
            return;
        };

        if let Err(e) = handler(self, id) {
            error!("{:?} handler for '{}' failed: {:?}", slot, uid, e);
        }

        // Reinstall unless the control was removed by its own handler or
        // the handler replaced itself.
        if self.get(id).is_some() {
            let handlers = match slot {
                EventSlot::Changed => &mut self.changed_handlers,
                EventSlot::Click => &mut self.click_handlers,
            };
            handlers.entry(uid).or_insert(handler);
        }
    }

    /// PreRender: top-down. Validators settle whether this round trip
    /// renders uplevel (client echo).
    pub fn pre_render(&mut self) -> Result<()> {
        self.advance(Phase::RaisePostbackEvent, Phase::PreRender)?;
        let echo_enabled = self.config.client_echo_enabled;
        for id in self.preorder() {
            if let Some(control) = self.get_mut(id) {
                if let Some(validator) = control.validator_mut() {
                    validator.uplevel = validator.client_echo && echo_enabled;
                }
            }
        }
        Ok(())
    }

    /// Render: walks the visible tree into markup.
    pub fn render(&mut self) -> Result<String> {
        self.advance(Phase::PreRender, Phase::Render)?;
        let mut writer = HtmlWriter::new();
        self.render_node(self.root, &mut writer);
        Ok(writer.into_string())
    }

    fn render_node(
        &self,
        id: ControlId,
        writer: &mut HtmlWriter,
    ) {
        let Some(control) = self.get(id) else { return };
        if !control.visible {
            return; // invisible subtrees render nothing
        }
        let client_id = self.client_id(id).unwrap_or_default();
        let unique_id = self.unique_id(id).unwrap_or_default();

        match &control.kind {
            ControlKind::Page => {
                for child in control.children.clone() {
                    self.render_node(child, writer);
                }
            }
            ControlKind::Literal(text) => writer.raw(text),
            ControlKind::Form => {
                writer.open(
                    "form",
                    &[
                        ("id".to_string(), client_id),
                        ("method".to_string(), "post".to_string()),
                    ],
                );
                for child in control.children.clone() {
                    self.render_node(child, writer);
                }
                writer.close("form");
            }
            ControlKind::TextBox => {
                writer.self_closing(
                    "input",
                    &[
                        ("type".to_string(), "text".to_string()),
                        ("id".to_string(), client_id),
                        ("name".to_string(), unique_id),
                        ("value".to_string(), control.text().to_string()),
                    ],
                );
            }
            ControlKind::Label => {
                writer.open("span", &[("id".to_string(), client_id)]);
                writer.text(control.text());
                writer.close("span");
            }
            ControlKind::Button => {
                writer.self_closing(
                    "input",
                    &[
                        ("type".to_string(), "submit".to_string()),
                        ("id".to_string(), client_id),
                        ("name".to_string(), unique_id),
                        ("value".to_string(), control.text().to_string()),
                    ],
                );
            }
            ControlKind::Custom(_) => {
                writer.open("div", &[("id".to_string(), client_id)]);
                for child in control.children.clone() {
                    self.render_node(child, writer);
                }
                writer.close("div");
            }
            ControlKind::Validator(_) => self.render_validator(id, writer),
        }
    }

    fn render_validator(
        &self,
        id: ControlId,
        writer: &mut HtmlWriter,
    ) {
        let Some(control) = self.get(id) else { return };
        let Some(state) = control.validator() else { return };
        let display = display_of(control);
        let should_be_visible = control.enabled && !state.is_valid;

        let (display_tags, display_contents) = if state.uplevel {
            (true, display != ValidatorDisplay::None)
        } else {
            let shown = display != ValidatorDisplay::None && should_be_visible;
            (shown, shown)
        };

        let mut attrs = vec![("id".to_string(), self.client_id(id).unwrap_or_default())];
        if state.uplevel {
            attrs.extend(client_attributes(self, id));
            if display == ValidatorDisplay::None
                || (!should_be_visible && display == ValidatorDisplay::Dynamic)
            {
                attrs.push(("style".to_string(), "display:none".to_string()));
            } else if !should_be_visible {
                attrs.push(("style".to_string(), "visibility:hidden".to_string()));
            }
        }

        if display_tags {
            writer.open("span", &attrs);
        }
        if display_contents {
            let text = if control.text().is_empty() {
                control.error_message()
            } else {
                control.text()
            };
            writer.text(text);
        } else if !state.uplevel && display == ValidatorDisplay::Static {
            // Downlevel static mode keeps table cells from collapsing.
            writer.raw("&nbsp;");
        }
        if display_tags {
            writer.close("span");
        }
    }

    /// SaveState: emits only dirty entries, positional per node, with the
    /// unchanged sentinel keeping the payload minimal.
    pub fn save_state(&mut self) -> Result<NodeState> {
        self.advance(Phase::Render, Phase::SaveState)?;
        Ok(self.capture_node_state(self.root))
    }

    fn capture_node_state(
        &self,
        id: ControlId,
    ) -> NodeState {
        let Some(control) = self.get(id) else {
            return NodeState::default();
        };

        let dirty = control.state.dirty_entries();
        let bag = if dirty.is_empty() { None } else { Some(dirty) };

        let children = control
            .children
            .iter()
            .enumerate()
            .filter_map(|(position, child)| {
                let child_state = self.capture_node_state(*child);
                (!child_state.is_empty()).then_some((position, child_state))
            })
            .collect();

        NodeState { bag, children }
    }

    /// Unload: drops the request-scoped registries.
    pub fn unload(&mut self) -> Result<()> {
        self.advance(Phase::SaveState, Phase::Unload)?;
        self.validators.clear();
        self.postback_targets.clear();
        self.changed_handlers.clear();
        self.click_handlers.clear();
        Ok(())
    }

    /// Replays the full lifecycle for one request.
    ///
    /// A corrupted view-state subtree is logged and the page partially
    /// renders; a malformed payload (undecodable) is fatal.
    pub fn process_request(
        &mut self,
        postback: Option<&PostbackData>,
        prior_state: Option<&[u8]>,
    ) -> Result<PageResponse> {
        self.init()?;

        let node_state = match prior_state {
            Some(bytes) => Some(NodeState::from_bytes(bytes)?),
            None => None,
        };
        if let Err(e) = self.load_state(node_state.as_ref()) {
            match &e {
                Error::State(StateError::Corruption { .. }) => {
                    warn!("continuing after view-state corruption: {}", e);
                }
                _ => return Err(e),
            }
        }

        self.is_postback = postback.is_some();
        let data = postback.cloned().unwrap_or_default();
        self.load_postback_data(&data)?;
        self.raise_changed_events()?;
        self.raise_postback_event(&data)?;

        self.pre_render()?;
        let html = self.render()?;
        let view_state = self.save_state()?.to_bytes()?;
        let is_valid = self.page_valid;
        self.unload()?;

        Ok(PageResponse {
            html,
            view_state,
            is_valid,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum EventSlot {
    Changed,
    Click,
}
