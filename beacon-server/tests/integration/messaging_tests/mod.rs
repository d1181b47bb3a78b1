mod test_server_message_echo;
mod test_targeted_messages;
