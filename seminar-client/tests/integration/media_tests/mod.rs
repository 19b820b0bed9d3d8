mod test_screen_share_permissions;
