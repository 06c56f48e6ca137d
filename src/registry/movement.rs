//! Player movement, grabbing, dropping and the per-step driver

use super::Registry;
use crate::core::config::DropPolicy;
use crate::core::types::{Coord, Direction, Event, ObjId, Size};
use crate::world::objects::ObjKind;
use tracing::debug;

impl Registry {
    /// Applies one command: grab or drop first, then move, then redraw.
    ///
    /// With `grab` set an idle player grabs whatever has priority at its
    /// cell; without it a holding player drops. A terminal event from the
    /// grab or drop ends the step before the player moves.
    pub fn step(&mut self, direction: Direction, grab: bool) -> Event {
        let holding = self.player.is_holding();
        let event = match (grab, holding) {
            (true, false) => self.handle_grab(),
            (false, true) => self.handle_drop(),
            _ => Event::Step,
        };
        if !event.is_terminal() {
            self.move_player(direction);
        }
        self.draw_register();
        event
    }

    /// Moves the player one unit, carrying any held object. Returns false
    /// for `Stay` and for moves that would leave the playable area.
    pub fn move_player(&mut self, direction: Direction) -> bool {
        let target = self.player_coord().step(direction);
        self.place_player(target)
    }

    /// Puts the player at `coord` if both it and the held object's
    /// offset footprint stay playable. Nothing moves otherwise.
    pub(crate) fn place_player(&mut self, coord: Coord) -> bool {
        let player_id = self.player.id;
        let Some(current) = self.objects.get(player_id).map(|o| o.coord) else {
            return false;
        };
        if coord == current || !self.grid.is_playable(coord, Size::UNIT) {
            return false;
        }

        match self.player.held {
            Some(held) => {
                let Some(size) = self.objects.get(held.obj).map(|o| o.size) else {
                    return false;
                };
                if !self.grid.is_playable(coord + held.offset, size) {
                    return false;
                }
                let Some((player, obj)) = self.objects.pair_mut(player_id, held.obj) else {
                    return false;
                };
                self.index.move_player(player, Some((obj, held.offset)), coord);
            }
            None => {
                let Some(player) = self.objects.get_mut(player_id) else {
                    return false;
                };
                self.index.move_player(player, None, coord);
            }
        }
        true
    }

    /// The object a grab would pick at the player's cell.
    ///
    /// Kind priority decides first (button, blocks by ascending value,
    /// piles by ascending value), then distance from the object's anchor
    /// to the player, then the lowest id.
    pub fn grab_candidate(&self) -> Option<ObjId> {
        let here = self.player_coord();
        self.index
            .objs_at(here)
            .filter(|(_, id)| self.is_grabbable(*id))
            .filter_map(|(kind, id)| {
                let priority = kind.grab_priority()?;
                let anchor = self.objects.get(id)?.coord;
                Some((priority, anchor.distance_sq(&here), id))
            })
            .min()
            .map(|(_, _, id)| id)
    }

    fn is_grabbable(&self, id: ObjId) -> bool {
        self.blocks.contains(&id) || self.piles.contains(&id) || self.button == Some(id)
    }

    /// Grabs at the player's cell. Grabbing a pile makes a new block of
    /// its denomination under the player and holds that. Grabbing the
    /// button raises `ButtonPress`.
    pub fn handle_grab(&mut self) -> Event {
        if self.player.is_holding() {
            return Event::Step;
        }
        let Some(id) = self.grab_candidate() else {
            return Event::Step;
        };
        let Some(kind) = self.objects.get(id).map(|o| o.kind) else {
            return Event::Step;
        };
        let here = self.player_coord();

        match kind {
            ObjKind::Button => {
                self.raise(Event::ButtonPress);
                return Event::ButtonPress;
            }
            ObjKind::Pile(denom) => {
                if !self.grid.is_playable(here, denom.block_size()) {
                    debug!(?denom, coord = ?here, "no room for a block from this pile");
                    return Event::Step;
                }
                let block = self.make_block(denom, here);
                self.player.grab(block, Coord::new(0, 0));
                debug!(id = block.0, ?denom, "grabbed new block from pile");
            }
            ObjKind::Block(_) => {
                let anchor = self.objects.get(id).map(|o| o.coord).unwrap_or(here);
                self.player.grab(id, anchor - here);
                debug!(id = id.0, offset = ?(anchor - here), "grabbed block");
            }
            _ => {}
        }
        Event::Step
    }

    /// Releases the held object where it stands.
    ///
    /// A block dropped on a pile goes back to supply (deleted). One dropped
    /// on the button slides down by the button's height. Otherwise the drop
    /// policy applies: stacked blocks merge, or spread blocks move to the
    /// nearest free spot. Returns `Full` if a required search fails.
    pub fn handle_drop(&mut self) -> Event {
        let Some(id) = self.player.drop_held() else {
            return Event::Step;
        };
        let Some((coord, size)) = self.objects.get(id).map(|o| (o.coord, o.size)) else {
            return Event::Step;
        };
        let under = self.index.overlapping(coord, size);

        if under.iter().any(|o| self.piles.contains(o)) {
            debug!(id = id.0, "block returned to pile");
            self.delete_obj(id);
            return Event::Step;
        }

        if let Some(button) = self.button.filter(|b| under.contains(b)) {
            let height = self.objects.get(button).map(|b| b.size.rows).unwrap_or(1);
            let slid = coord + Coord::new(height, 0);
            let dest = if self.grid.is_playable(slid, size) {
                Some(slid)
            } else {
                self.find_space_for(size, coord, Some(id))
            };
            return match dest {
                Some(dest) => {
                    self.move_obj(id, dest);
                    debug!(id = id.0, to = ?dest, "block slid off button");
                    Event::Step
                }
                None => Event::Full,
            };
        }

        match self.config.drop_policy {
            DropPolicy::Stack => {
                self.attempt_merge(coord);
            }
            DropPolicy::Spread => {
                let crowded = under
                    .iter()
                    .any(|o| *o != id && *o != self.player.id);
                if crowded {
                    match self.find_space_for(size, coord, Some(id)) {
                        Some(dest) => {
                            self.move_obj(id, dest);
                            debug!(id = id.0, to = ?dest, "dropped block spread");
                        }
                        None => return Event::Full,
                    }
                }
            }
        }
        debug!(id = id.0, ?coord, "dropped block");
        Event::Step
    }
}
