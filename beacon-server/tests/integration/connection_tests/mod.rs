mod test_hello_required_first;
mod test_single_client_joins_room;
mod test_ws_handshake;
