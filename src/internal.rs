pub(crate) mod internal_game_loop;
