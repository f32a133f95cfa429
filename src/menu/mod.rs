//! Table-driven menu state machine.
//!
//! Same shape as a classic embedded FSM, with pages as states and button
//! edges as the only inputs:
//!
//! ```text
//!  page table (pages.rs)                 transitions (transitions.rs)
//!  ┌────────────┬──────────┬─────────┐   ┌────────────┬──────┬────────────┐
//!  │ PageId     │ on_enter │ on_exit │   │ PageId     │ Role │ MenuAction │
//!  ├────────────┼──────────┼─────────┤   ├────────────┼──────┼────────────┤
//!  │ Main       │ -        │ -       │   │ Main       │ Inc  │ SelectNext │
//!  │ EditVolume │ fn(ctx)  │ fn(ctx) │   │ EditVolume │ Inc  │ AdjustDraft│
//!  │ ...        │          │         │   │ ...        │      │            │
//!  └────────────┴──────────┴─────────┘   └────────────┴──────┴────────────┘
//! ```
//!
//! Each accepted press is looked up by `(page, role)`.  Navigation actions
//! move the [`MenuNode`]; every other action is performed against the
//! shared [`ControllerContext`] by [`actions::perform`] and may ask for a
//! page change in return.  Page changes run `on_exit` of the old page,
//! then `on_enter` of the new one.

pub mod actions;
pub mod pages;
pub mod transitions;

use log::{debug, info};

use crate::app::context::ControllerContext;
use crate::app::events::AppEvent;
use crate::clock::{Millis, elapsed};
use crate::drivers::button::ButtonRole;
use actions::Nav;
use pages::PageDescriptor;
use transitions::MenuAction;

// ---------------------------------------------------------------------------
// Page identity
// ---------------------------------------------------------------------------

/// Every page of the menu.
/// Must stay in sync with the table built in [`pages::build_page_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PageId {
    Main = 0,
    AutoWatering = 1,
    ManualWatering = 2,
    Settings = 3,
    Calibration = 4,
    Debug = 5,
    EditInterval = 6,
    EditVolume = 7,
    EditSpeed = 8,
    ResetSettings = 9,
    CalibrationTrial = 10,
}

impl PageId {
    pub const COUNT: usize = 11;

    /// Convert an index back to `PageId`.  Out-of-range indices map to
    /// `Main`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Main,
            1 => Self::AutoWatering,
            2 => Self::ManualWatering,
            3 => Self::Settings,
            4 => Self::Calibration,
            5 => Self::Debug,
            6 => Self::EditInterval,
            7 => Self::EditVolume,
            8 => Self::EditSpeed,
            9 => Self::ResetSettings,
            10 => Self::CalibrationTrial,
            _ => {
                debug_assert!(false, "invalid page index: {idx}");
                Self::Main
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Menu node
// ---------------------------------------------------------------------------

/// Where the user is.  Invariant: `selection < item_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuNode {
    pub page: PageId,
    pub selection: usize,
    pub item_count: usize,
    pub parent: Option<PageId>,
}

impl MenuNode {
    fn at(desc: &PageDescriptor, selection: usize) -> Self {
        // Pages without a list still have one implicit item.
        let item_count = desc.items.len().max(1);
        Self {
            page: desc.page,
            selection: selection.min(item_count - 1),
            item_count,
            parent: desc.parent,
        }
    }

    fn select_next(&mut self) {
        self.selection = (self.selection + 1) % self.item_count;
    }

    fn select_previous(&mut self) {
        self.selection = (self.selection + self.item_count - 1) % self.item_count;
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct MenuStateMachine {
    table: [PageDescriptor; PageId::COUNT],
    node: MenuNode,
    /// Selection to restore on each page when returning to it.
    remembered: [usize; PageId::COUNT],
    last_input_ms: Millis,
}

impl MenuStateMachine {
    pub fn new(now: Millis) -> Self {
        let table = pages::build_page_table();
        let node = MenuNode::at(&table[PageId::Main as usize], 0);
        Self {
            table,
            node,
            remembered: [0; PageId::COUNT],
            last_input_ms: now,
        }
    }

    /// Run `on_enter` for the starting page.  Call once before the first
    /// input.
    pub fn start(&mut self, ctx: &mut ControllerContext) {
        let desc = self.descriptor();
        info!("Menu starting on page: {}", desc.name);
        if let Some(enter) = desc.on_enter {
            enter(ctx);
        }
    }

    /// Apply one accepted button press.
    pub fn handle(&mut self, role: ButtonRole, ctx: &mut ControllerContext) {
        self.last_input_ms = ctx.now_ms;

        let mut action = transitions::lookup(self.node.page, role);
        if action == MenuAction::ActivateItem {
            action = self
                .descriptor()
                .items
                .get(self.node.selection)
                .map_or(MenuAction::Ignore, |item| item.action);
        }

        match action {
            MenuAction::Ignore => {
                debug!("Menu: {:?} ignored on {}", role, self.descriptor().name);
            }
            MenuAction::SelectNext => self.node.select_next(),
            MenuAction::SelectPrevious => self.node.select_previous(),
            other => match actions::perform(other, ctx) {
                Nav::Stay => {}
                Nav::Back => self.go_back(ctx),
                Nav::Open(page) => self.open(page, ctx),
            },
        }
    }

    /// Per-tick housekeeping: the idle timeout back to `Main`.
    ///
    /// The timeout is suspended while a pump run is in flight.
    pub fn tick(&mut self, ctx: &mut ControllerContext) {
        let timeout = Millis::from(ctx.config.menu_idle_timeout_ms);
        if timeout == 0 || self.node.page == PageId::Main {
            return;
        }
        if ctx.pump.is_active() {
            self.last_input_ms = ctx.now_ms;
            return;
        }
        if elapsed(ctx.now_ms, self.last_input_ms) >= timeout {
            info!(
                "Menu: idle for {} ms on {}, returning to main",
                timeout,
                self.descriptor().name
            );
            self.transition(PageId::Main, 0, ctx);
        }
    }

    pub fn page(&self) -> PageId {
        self.node.page
    }

    pub fn node(&self) -> &MenuNode {
        &self.node
    }

    pub fn descriptor(&self) -> &PageDescriptor {
        &self.table[self.node.page as usize]
    }

    /// Label of the highlighted item, if the page has a list.
    pub fn selected_label(&self) -> Option<&'static str> {
        self.descriptor()
            .items
            .get(self.node.selection)
            .map(|item| item.label)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Forward navigation into a page starts at its first item.
    fn open(&mut self, page: PageId, ctx: &mut ControllerContext) {
        self.transition(page, 0, ctx);
    }

    /// Return to the parent page with its selection restored.  At the top
    /// level this is a no-op.
    fn go_back(&mut self, ctx: &mut ControllerContext) {
        if let Some(parent) = self.node.parent {
            let selection = self.remembered[parent as usize];
            self.transition(parent, selection, ctx);
        }
    }

    fn transition(&mut self, next: PageId, selection: usize, ctx: &mut ControllerContext) {
        let from = self.node.page;
        if from == next {
            return;
        }

        info!(
            "Menu: {} -> {}",
            self.table[from as usize].name, self.table[next as usize].name
        );

        self.remembered[from as usize] = self.node.selection;
        if let Some(exit) = self.table[from as usize].on_exit {
            exit(ctx);
        }

        self.node = MenuNode::at(&self.table[next as usize], selection);

        if let Some(enter) = self.table[next as usize].on_enter {
            enter(ctx);
        }
        ctx.push_event(AppEvent::PageChanged { from, to: next });
    }
}
